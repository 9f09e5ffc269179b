/// Stripe PaymentIntent 연동
// region:    --- Imports
use crate::config::StripeConfig;
use crate::error::AppError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

// endregion: --- Imports

/// 결제 의도 (Stripe PaymentIntent 의 필요한 필드만)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub client_secret: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl PaymentIntent {
    pub fn succeeded(&self) -> bool {
        self.status == "succeeded"
    }

    /// 생성 시 metadata[order_id] 로 넣은 주문 번호
    pub fn order_id(&self) -> Option<i64> {
        self.metadata.get("order_id").and_then(|id| id.parse().ok())
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, order_id: i64, amount: i64) -> Result<PaymentIntent, AppError>;
    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, AppError>;
}

pub type DynPaymentGateway = Arc<dyn PaymentGateway>;

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

pub struct StripeGateway {
    client: reqwest::Client,
    config: StripeConfig,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn ensure_configured(&self) -> Result<(), AppError> {
        if self.config.secret_key.is_empty() {
            return Err(AppError::Payment(
                "결제 설정이 되어 있지 않습니다 (STRIPE_SECRET_KEY)".to_string(),
            ));
        }
        Ok(())
    }

    async fn parse_response(response: reqwest::Response) -> Result<PaymentIntent, AppError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<PaymentIntent>()
                .await
                .map_err(|e| AppError::Payment(e.to_string()));
        }
        let message = response
            .json::<StripeErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error.message)
            .unwrap_or_else(|| format!("Stripe 응답 오류: {}", status));
        warn!("{:<12} --> {}", "Payment", message);
        Err(AppError::Payment(message))
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(&self, order_id: i64, amount: i64) -> Result<PaymentIntent, AppError> {
        self.ensure_configured()?;
        info!(
            "{:<12} --> PaymentIntent 생성 order_id={} amount={}",
            "Payment", order_id, amount
        );
        let form = [
            ("amount", amount.to_string()),
            ("currency", self.config.currency.clone()),
            ("metadata[order_id]", order_id.to_string()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
        ];
        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.config.api_base))
            .bearer_auth(&self.config.secret_key)
            .header("Idempotency-Key", format!("order-{}-{}", order_id, amount))
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::Payment(e.to_string()))?;
        Self::parse_response(response).await
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, AppError> {
        self.ensure_configured()?;
        let response = self
            .client
            .get(format!("{}/v1/payment_intents/{}", self.config.api_base, intent_id))
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(|e| AppError::Payment(e.to_string()))?;
        Self::parse_response(response).await
    }
}
