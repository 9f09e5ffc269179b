use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

// 입찰 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: i64,
    pub product_id: i64,
    pub bidder_id: i64,
    pub amount: i64,
    pub is_auto: bool,
    pub bid_time: DateTime<Utc>,
}

// 자동 입찰 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AutoBid {
    pub id: i64,
    pub product_id: i64,
    pub bidder_id: i64,
    pub max_amount: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 입찰 이력 표시용 (입찰자 이름 일부 가림)
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BidView {
    pub id: i64,
    pub bidder_id: i64,
    pub bidder_name: String,
    pub amount: i64,
    pub is_auto: bool,
    pub bid_time: DateTime<Utc>,
}

impl BidView {
    pub fn masked(mut self) -> Self {
        self.bidder_name = mask_name(&self.bidder_name);
        self
    }
}

/// "홍길동" -> "**동", "Alice Smith" -> "****th"
pub fn mask_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().filter(|c| !c.is_whitespace()).collect();
    let visible = if chars.len() > 4 { 2 } else { 1 };
    let hidden = chars.len().saturating_sub(visible).min(4);
    let tail: String = chars[chars.len().saturating_sub(visible)..].iter().collect();
    format!("{}{}", "*".repeat(hidden), tail)
}

/// 입찰 명령
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PlaceBidRequest {
    #[validate(range(min = 1))]
    pub product_id: i64,
    #[validate(range(
        min = 1,
        max = 1_000_000_000_000i64,
        message = "입찰 금액은 0보다 커야 합니다. (최대 1조)"
    ))]
    pub amount: i64,
}

/// 자동 입찰 명령
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AutoBidRequest {
    #[validate(range(min = 1))]
    pub product_id: i64,
    #[validate(range(
        min = 1,
        max = 1_000_000_000_000i64,
        message = "최대 금액은 0보다 커야 합니다. (최대 1조)"
    ))]
    pub max_amount: i64,
}

/// 입찰 거부 명령
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RejectBidderRequest {
    #[validate(range(min = 1))]
    pub bidder_id: i64,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

/// 입찰 처리 결과 응답
#[derive(Debug, Serialize)]
pub struct BidOutcome {
    pub product_id: i64,
    pub current_price: i64,
    pub highest_bidder_id: i64,
    pub leading: bool,
    pub end_time: DateTime<Utc>,
    pub extended: bool,
    pub sold: bool,
    pub order_id: Option<i64>,
}
