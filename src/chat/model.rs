use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

// 채팅 메시지 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChatMessage {
    pub id: i64,
    pub order_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 2000, message = "메시지는 1~2000자여야 합니다."))]
    pub content: String,
}
