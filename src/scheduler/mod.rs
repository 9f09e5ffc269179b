/// 경매 상태 업데이트 스케줄러
/// 매 틱마다
/// 1. SCHEDULED -> ACTIVE (시작 시간 도달)
/// 2. ACTIVE -> SOLD(주문 생성) | ENDED (종료 시간 경과)
/// 3. 결제 기한이 지난 주문 취소
/// 즉시 구매로 낙찰된 상품은 입찰 커맨드에서 SOLD 로 처리된다.
// region:    --- Imports
use crate::auction::lifecycle;
use crate::database::DatabaseManager;
use crate::error::AppResult;
use crate::event_store::DynEventPublisher;
use crate::orders::commands::cancel_expired_orders;
use crate::realtime::hub::RealtimeHub;
use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info};

// endregion: --- Imports

// region:    --- Auction Scheduler
/// 경매 상태 업데이트 스케줄러
pub struct AuctionScheduler {
    db_manager: Arc<DatabaseManager>,
    publisher: DynEventPublisher,
    hub: Arc<RealtimeHub>,
    tick: Duration,
    payment_deadline_hours: i64,
}

impl AuctionScheduler {
    pub fn new(
        db_manager: Arc<DatabaseManager>,
        publisher: DynEventPublisher,
        hub: Arc<RealtimeHub>,
        tick_secs: u64,
        payment_deadline_hours: i64,
    ) -> Self {
        Self {
            db_manager,
            publisher,
            hub,
            tick: Duration::from_secs(tick_secs.max(1)),
            payment_deadline_hours,
        }
    }

    /// 경매 상태 업데이트 스케줄러 시작
    pub fn start(self) -> JoinHandle<()> {
        info!("{:<12} --> 스케줄러 시작 ({:?} 간격)", "Scheduler", self.tick);
        tokio::spawn(async move {
            let mut interval = interval(self.tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if let Err(e) = self.run_once().await {
                    error!(
                        "{:<12} --> 경매 상태 업데이트 중 오류 발생: {:?}",
                        "Scheduler", e
                    );
                }
            }
        })
    }

    /// 한 틱 처리
    pub async fn run_once(&self) -> AppResult<()> {
        let now = Utc::now();

        let activated = lifecycle::activate_scheduled(&self.db_manager, now).await?;
        if activated > 0 {
            info!("{:<12} --> 경매 시작: {}건", "Scheduler", activated);
        }

        for product_id in lifecycle::due_auctions(&self.db_manager, now).await? {
            // 한 건 실패가 나머지 마감을 막지 않게
            if let Err(e) = lifecycle::close_auction(
                &self.db_manager,
                self.publisher.as_ref(),
                product_id,
                self.payment_deadline_hours,
            )
            .await
            {
                error!(
                    "{:<12} --> 경매 마감 실패 product: {}: {:?}",
                    "Scheduler", product_id, e
                );
            }
        }

        let cancelled =
            cancel_expired_orders(&self.db_manager, self.publisher.as_ref(), now).await?;
        if cancelled > 0 {
            info!("{:<12} --> 결제 기한 초과 주문 취소: {}건", "Scheduler", cancelled);
        }

        self.hub.prune();
        debug!(
            "{:<12} --> 경매 상태가 성공적으로 업데이트되었습니다.",
            "Scheduler"
        );
        Ok(())
    }
}
// endregion: --- Auction Scheduler
