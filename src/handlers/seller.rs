// region:    --- Imports
use crate::auth::AuthUser;
use crate::catalog::model::{Page, Product, ProductFilter};
use crate::dashboard::model::SellerDashboard;
use crate::error::AppResult;
use crate::orders::model::OrderSummary;
use crate::query::handlers as query;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::Json;

// endregion: --- Imports

pub async fn handle_dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<SellerDashboard>> {
    user.require_seller()?;
    Ok(Json(query::get_seller_dashboard(&state.db, user.id).await?))
}

/// 내 상품 (상태를 지정하지 않으면 전체)
pub async fn handle_products(
    State(state): State<AppState>,
    user: AuthUser,
    Query(mut filter): Query<ProductFilter>,
) -> AppResult<Json<Page<Product>>> {
    user.require_seller()?;
    filter.seller_id = Some(user.id);
    Ok(Json(query::list_products(&state.db, &filter).await?))
}

pub async fn handle_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<OrderSummary>>> {
    user.require_seller()?;
    Ok(Json(query::get_seller_orders(&state.db, user.id).await?))
}
