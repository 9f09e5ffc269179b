pub mod admin;
pub mod auth;
pub mod bidding;
pub mod catalog;
pub mod chat;
pub mod orders;
pub mod payments;
pub mod seller;
pub mod users;

use axum::Json;
use serde_json::{json, Value};

/// GET /health (DB 접근 없음)
pub async fn handle_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
