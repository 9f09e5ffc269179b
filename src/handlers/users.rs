// region:    --- Imports
use crate::auth::AuthUser;
use crate::catalog::model::Product;
use crate::error::AppResult;
use crate::orders::model::{OrderRoleFilter, OrderSummary};
use crate::query::handlers as query;
use crate::reviews::model::ReviewView;
use crate::state::AppState;
use crate::users::commands;
use crate::users::model::{
    ChangePasswordRequest, MyBidView, PublicProfile, UpdateProfileRequest, User,
};
use crate::validation::ValidatedJson;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

// endregion: --- Imports

pub async fn handle_get_me(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<User>> {
    Ok(Json(query::get_user(state.db.pool(), user.id).await?))
}

pub async fn handle_update_me(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<Json<User>> {
    Ok(Json(commands::handle_update_profile(&state.db, user.id, req).await?))
}

pub async fn handle_change_password(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> AppResult<Json<Value>> {
    commands::handle_change_password(&state.db, &state.hasher, user.id, req).await?;
    Ok(Json(json!({ "message": "비밀번호가 변경되었습니다." })))
}

/// 판매자 전환 요청
pub async fn handle_seller_request(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<User>> {
    Ok(Json(commands::handle_seller_request(&state.db, user.id).await?))
}

pub async fn handle_get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<PublicProfile>> {
    Ok(Json(query::get_public_profile(&state.db, user_id).await?))
}

pub async fn handle_get_reviews(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<ReviewView>>> {
    Ok(Json(query::get_user_reviews(&state.db, user_id).await?))
}

// region:    --- Watchlist

pub async fn handle_get_watchlist(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<Product>>> {
    Ok(Json(query::get_watchlist(&state.db, user.id).await?))
}

pub async fn handle_add_watch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<i64>,
) -> AppResult<StatusCode> {
    commands::handle_add_watch(&state.db, user.id, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn handle_remove_watch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<i64>,
) -> AppResult<StatusCode> {
    commands::handle_remove_watch(&state.db, user.id, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// endregion: --- Watchlist

// region:    --- Bidder Dashboard

pub async fn handle_my_bids(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<MyBidView>>> {
    Ok(Json(query::get_my_bids(&state.db, user.id).await?))
}

/// 낙찰 받은 주문
pub async fn handle_my_won(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<OrderSummary>>> {
    Ok(Json(
        query::get_my_orders(&state.db, user.id, Some(OrderRoleFilter::Buyer), None).await?,
    ))
}

// endregion: --- Bidder Dashboard
