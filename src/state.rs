// region:    --- Imports
use crate::auth::jwt::JwtManager;
use crate::auth::password::PasswordHasher;
use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::error::AppError;
use crate::event_store::{DynEventPublisher, LocalEventPublisher};
use crate::payments::{DynPaymentGateway, StripeGateway};
use crate::realtime::hub::RealtimeHub;
use std::sync::Arc;

// endregion: --- Imports

/// 핸들러 공유 상태
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseManager>,
    pub publisher: DynEventPublisher,
    pub hub: Arc<RealtimeHub>,
    pub jwt: Arc<JwtManager>,
    pub hasher: PasswordHasher,
    pub payments: DynPaymentGateway,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// 기본 구성: 로컬 이벤트 발행, Stripe 결제
    pub fn new(config: AppConfig, db: Arc<DatabaseManager>) -> Result<Self, AppError> {
        let hub = Arc::new(RealtimeHub::new());
        let publisher: DynEventPublisher = Arc::new(LocalEventPublisher::new(Arc::clone(&hub)));
        let payments: DynPaymentGateway = Arc::new(StripeGateway::new(config.stripe.clone())?);
        let jwt = Arc::new(JwtManager::new(
            &config.jwt_secret,
            config.access_token_minutes,
            config.refresh_token_days,
        ));
        Ok(Self {
            db,
            publisher,
            hub,
            jwt,
            hasher: PasswordHasher::default(),
            payments,
            config: Arc::new(config),
        })
    }

    pub fn with_publisher(mut self, publisher: DynEventPublisher) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn with_payments(mut self, payments: DynPaymentGateway) -> Self {
        self.payments = payments;
        self
    }

    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = hasher;
        self
    }
}
