use crate::orders::status::{OrderStatus, TransitionError, TransitionPayload};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

// 주문 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: i64,
    pub product_id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub final_price: i64,
    pub status: String,
    pub shipping_address: Option<String>,
    pub tracking_number: Option<String>,
    pub payment_intent_id: Option<String>,
    pub cancel_reason: Option<String>,
    pub payment_deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn order_status(&self) -> Result<OrderStatus, TransitionError> {
        self.status.parse()
    }

    pub fn is_party(&self, user_id: i64) -> bool {
        self.buyer_id == user_id || self.seller_id == user_id
    }
}

/// 주문 목록 항목 (상품 제목 포함)
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct OrderSummary {
    pub id: i64,
    pub product_id: i64,
    pub product_title: String,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub final_price: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// PUT /orders/:id
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateOrderRequest {
    pub status: String,
    #[validate(length(max = 500))]
    pub shipping_address: Option<String>,
    #[validate(length(max = 100))]
    pub tracking_number: Option<String>,
    #[validate(length(max = 500))]
    pub cancel_reason: Option<String>,
}

impl UpdateOrderRequest {
    pub fn payload(&self) -> TransitionPayload {
        TransitionPayload {
            shipping_address: self.shipping_address.clone(),
            tracking_number: self.tracking_number.clone(),
            cancel_reason: self.cancel_reason.clone(),
            payment_intent_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderRoleFilter {
    Buyer,
    Seller,
}

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub role: Option<OrderRoleFilter>,
    pub status: Option<String>,
}
