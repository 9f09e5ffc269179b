// region:    --- Imports
use crate::auth::AuthUser;
use crate::bidding::commands::{
    handle_bid, handle_cancel_auto_bid, handle_reject_bidder, BidCommand,
};
use crate::bidding::engine::BidKind;
use crate::bidding::model::{
    AutoBidRequest, BidOutcome, BidView, PlaceBidRequest, RejectBidderRequest,
};
use crate::catalog::model::Product;
use crate::error::AppResult;
use crate::query::handlers as query;
use crate::state::AppState;
use crate::validation::ValidatedJson;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

// endregion: --- Imports

// region:    --- Command Handlers

/// 입찰 요청 처리
pub async fn handle_place_bid(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<PlaceBidRequest>,
) -> AppResult<Json<BidOutcome>> {
    let outcome = handle_bid(
        &state.db,
        state.publisher.as_ref(),
        &state.config,
        user.id,
        req.product_id,
        BidCommand::Place(BidKind::Manual { amount: req.amount }),
    )
    .await?;
    Ok(Json(outcome))
}

/// 자동 입찰 등록 (상한 변경 포함)
pub async fn handle_auto_bid(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<AutoBidRequest>,
) -> AppResult<Json<BidOutcome>> {
    let outcome = handle_bid(
        &state.db,
        state.publisher.as_ref(),
        &state.config,
        user.id,
        req.product_id,
        BidCommand::Place(BidKind::Auto {
            max_amount: req.max_amount,
        }),
    )
    .await?;
    Ok(Json(outcome))
}

pub async fn handle_delete_auto_bid(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<i64>,
) -> AppResult<StatusCode> {
    handle_cancel_auto_bid(&state.db, user.id, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 즉시 구매 요청 처리
pub async fn handle_buy_now(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<i64>,
) -> AppResult<Json<BidOutcome>> {
    let outcome = handle_bid(
        &state.db,
        state.publisher.as_ref(),
        &state.config,
        user.id,
        product_id,
        BidCommand::BuyNow,
    )
    .await?;
    Ok(Json(outcome))
}

/// 입찰자 거부 (판매자)
pub async fn handle_reject(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<RejectBidderRequest>,
) -> AppResult<Json<Product>> {
    let product =
        handle_reject_bidder(&state.db, state.publisher.as_ref(), user, product_id, req).await?;
    Ok(Json(product))
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 입찰 이력 조회
pub async fn handle_get_bid_history(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> AppResult<Json<Vec<BidView>>> {
    info!("{:<12} --> 입찰 이력 조회 요청: {}", "Query", product_id);
    Ok(Json(query::get_bid_history(&state.db, product_id).await?))
}

/// 최고 입찰가 조회
pub async fn handle_get_highest_bid(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> AppResult<Json<Option<BidView>>> {
    Ok(Json(query::get_highest_bid(&state.db, product_id).await?))
}

// endregion: --- Query Handlers
