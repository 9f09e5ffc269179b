// region:    --- Imports
use crate::auction::events::MarketEvent;
use crate::error::AppError;
use crate::message_broker::{KafkaConsumer, KafkaProducer};
use crate::realtime::hub::RealtimeHub;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use std::sync::Arc;
use tracing::{error, info, warn};

// endregion: --- Imports

// 동시 추가로 버전이 겹칠 때 재시도 횟수
const MAX_VERSION_RETRIES: i32 = 5;

// region:    --- Event Model
/// 이벤트 저장소에 저장되는 이벤트 모델
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct StoredEvent {
    pub id: i64,
    pub aggregate_type: String,
    pub aggregate_id: i64,
    pub event_type: String,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub version: i64,
}

impl StoredEvent {
    pub fn market_event(&self) -> Result<MarketEvent, serde_json::Error> {
        serde_json::from_value(self.data.clone())
    }
}
// endregion: --- Event Model

// region:    --- Append
/// 커맨드 트랜잭션 안에서 이벤트 추가
/// version 이 None 이면 집계(aggregate)의 마지막 버전 + 1
pub async fn append_event(
    conn: &mut PgConnection,
    event: &MarketEvent,
    version: Option<i64>,
) -> Result<StoredEvent, AppError> {
    let (aggregate_type, aggregate_id) = event.aggregate();
    let data = serde_json::to_value(event).map_err(|e| AppError::Internal(e.to_string()))?;
    let timestamp = Utc::now();

    for _ in 0..MAX_VERSION_RETRIES {
        let inserted = sqlx::query_as::<_, StoredEvent>(
            "INSERT INTO events (aggregate_type, aggregate_id, event_type, data, timestamp, version)
             SELECT $1, $2, $3, $4, $5,
                    COALESCE($6, (SELECT COALESCE(MAX(version), 0) + 1 FROM events
                                  WHERE aggregate_type = $1 AND aggregate_id = $2))
             ON CONFLICT (aggregate_type, aggregate_id, version) DO NOTHING
             RETURNING id, aggregate_type, aggregate_id, event_type, data, timestamp, version",
        )
        .bind(aggregate_type)
        .bind(aggregate_id)
        .bind(event.event_type())
        .bind(&data)
        .bind(timestamp)
        .bind(version)
        .fetch_optional(&mut *conn)
        .await?;

        match inserted {
            Some(stored) => return Ok(stored),
            None if version.is_some() => {
                return Err(AppError::Conflict("버전 충돌".to_string()));
            }
            None => {
                warn!(
                    "{:<12} --> 이벤트 버전 충돌, 재시도: {}:{}",
                    "EventStore", aggregate_type, aggregate_id
                );
            }
        }
    }

    Err(AppError::Conflict("버전 충돌".to_string()))
}
// endregion: --- Append

// region:    --- Publisher
/// 커밋된 이벤트 발행
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &StoredEvent) -> Result<(), AppError>;

    /// 커밋 이후 호출. 실패는 기록만 한다 (이벤트는 이미 저장됨)
    async fn publish_all(&self, events: &[StoredEvent]) {
        for event in events {
            if let Err(e) = self.publish(event).await {
                error!(
                    "{:<12} --> 이벤트 발행 실패 id={} type={}: {}",
                    "Publisher", event.id, event.event_type, e
                );
            }
        }
    }
}

pub type DynEventPublisher = Arc<dyn EventPublisher>;

/// 프로세스 내부 발행: 바로 실시간 허브로 전달
pub struct LocalEventPublisher {
    hub: Arc<RealtimeHub>,
}

impl LocalEventPublisher {
    pub fn new(hub: Arc<RealtimeHub>) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl EventPublisher for LocalEventPublisher {
    async fn publish(&self, event: &StoredEvent) -> Result<(), AppError> {
        let market_event = event
            .market_event()
            .map_err(|e| AppError::EventBus(e.to_string()))?;
        self.hub.dispatch(&market_event);
        Ok(())
    }
}

/// Kafka 발행
pub struct KafkaEventPublisher {
    producer: Arc<KafkaProducer>,
    topic: String,
}

impl KafkaEventPublisher {
    pub fn new(producer: Arc<KafkaProducer>, topic: &str) -> Self {
        Self {
            producer,
            topic: topic.to_string(),
        }
    }
}

#[async_trait]
impl EventPublisher for KafkaEventPublisher {
    async fn publish(&self, event: &StoredEvent) -> Result<(), AppError> {
        let payload =
            serde_json::to_string(event).map_err(|e| AppError::EventBus(e.to_string()))?;
        // 같은 집계의 이벤트는 같은 파티션으로
        let key = format!("{}:{}", event.aggregate_type, event.aggregate_id);
        self.producer
            .send_message(&self.topic, &key, &payload)
            .await
            .map_err(AppError::EventBus)
    }
}
// endregion: --- Publisher

// region:    --- Event Consumer
/// Kafka 이벤트를 실시간 허브로 전달
pub struct EventConsumer {
    hub: Arc<RealtimeHub>,
    kafka_consumer: Arc<KafkaConsumer>,
    topic: String,
}

impl EventConsumer {
    pub fn new(hub: Arc<RealtimeHub>, kafka_consumer: Arc<KafkaConsumer>, topic: &str) -> Self {
        EventConsumer {
            hub,
            kafka_consumer,
            topic: topic.to_string(),
        }
    }

    /// 이벤트 구독 시작
    pub async fn start(&self) {
        let hub = Arc::clone(&self.hub);
        if let Err(e) = self
            .kafka_consumer
            .consume_events(&self.topic, move |event| {
                let hub = Arc::clone(&hub);
                async move { Self::process_event(&hub, event) }
            })
            .await
        {
            error!("{:<12} --> 이벤트 소비 오류: {:?}", "EventConsume", e);
        }
    }

    /// 이벤트 처리
    fn process_event(hub: &RealtimeHub, event: StoredEvent) {
        match event.market_event() {
            Ok(market_event) => {
                info!(
                    "{:<12} --> {} ({}:{} v{})",
                    "EventConsume",
                    event.event_type,
                    event.aggregate_type,
                    event.aggregate_id,
                    event.version
                );
                hub.dispatch(&market_event);
            }
            Err(e) => warn!(
                "{:<12} --> 알 수 없는 이벤트 타입: {} ({})",
                "EventConsume", event.event_type, e
            ),
        }
    }
}
// endregion: --- Event Consumer

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(event: &MarketEvent) -> StoredEvent {
        let (aggregate_type, aggregate_id) = event.aggregate();
        StoredEvent {
            id: 1,
            aggregate_type: aggregate_type.to_string(),
            aggregate_id,
            event_type: event.event_type().to_string(),
            data: serde_json::to_value(event).unwrap(),
            timestamp: Utc::now(),
            version: 1,
        }
    }

    #[tokio::test]
    async fn local_publisher_delivers_to_the_hub() {
        let hub = Arc::new(RealtimeHub::new());
        let mut rx = hub.subscribe("order:4");
        let publisher = LocalEventPublisher::new(Arc::clone(&hub));

        let event = MarketEvent::ChatMessageSent {
            message_id: 10,
            order_id: 4,
            sender_id: 1,
            content: "입금했습니다".into(),
            timestamp: Utc::now(),
        };
        publisher.publish_all(&[stored(&event)]).await;

        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.event, "new-message");
        assert_eq!(frame.data["message_id"], 10);
    }

    #[tokio::test]
    async fn undecodable_events_are_reported() {
        let hub = Arc::new(RealtimeHub::new());
        let publisher = LocalEventPublisher::new(hub);
        let mut bad = stored(&MarketEvent::AuctionClosed {
            product_id: 1,
            winner_id: None,
            final_price: None,
            timestamp: Utc::now(),
        });
        bad.data = serde_json::json!({"Unknown": {}});
        assert!(matches!(
            publisher.publish(&bad).await,
            Err(AppError::EventBus(_))
        ));
    }
}
