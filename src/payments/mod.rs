pub mod commands;
pub mod stripe;

pub use stripe::{DynPaymentGateway, PaymentGateway, PaymentIntent, StripeGateway};

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateIntentRequest {
    #[validate(range(min = 1))]
    pub order_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ConfirmPaymentRequest {
    #[validate(range(min = 1))]
    pub order_id: i64,
    #[validate(length(min = 1, max = 255, message = "결제 ID가 필요합니다."))]
    pub payment_intent_id: String,
}

#[derive(Debug, Serialize)]
pub struct IntentResponse {
    pub payment_intent_id: String,
    pub client_secret: Option<String>,
    pub amount: i64,
    pub currency: String,
}
