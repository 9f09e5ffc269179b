// region:    --- Imports
use crate::auth::AuthUser;
use crate::chat::commands::authorized_order;
use crate::error::AppResult;
use crate::orders::commands::handle_update_order;
use crate::orders::model::{Order, OrderListQuery, OrderSummary, UpdateOrderRequest};
use crate::query::handlers as query;
use crate::reviews::commands::handle_create_review;
use crate::reviews::model::{CreateReviewRequest, Review};
use crate::state::AppState;
use crate::validation::ValidatedJson;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

// endregion: --- Imports

/// 내 주문 목록 (role=buyer|seller)
pub async fn handle_get_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<OrderListQuery>,
) -> AppResult<Json<Vec<OrderSummary>>> {
    Ok(Json(
        query::get_my_orders(&state.db, user.id, params.role, params.status.as_deref()).await?,
    ))
}

pub async fn handle_get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<i64>,
) -> AppResult<Json<Order>> {
    Ok(Json(authorized_order(&state.db, user, order_id, true).await?))
}

/// 주문 상태 변경
pub async fn handle_update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateOrderRequest>,
) -> AppResult<Json<Order>> {
    Ok(Json(
        handle_update_order(&state.db, state.publisher.as_ref(), user, order_id, req).await?,
    ))
}

/// 거래 평가
pub async fn handle_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<Review>)> {
    let review = handle_create_review(&state.db, user, order_id, req).await?;
    Ok((StatusCode::CREATED, Json(review)))
}
