// region:    --- Imports
use crate::auth::{AdminUser, AuthUser};
use crate::catalog::commands;
use crate::catalog::model::{
    Category, CategoryRequest, CreateProductRequest, Page, Product, ProductDetail, ProductFilter,
};
use crate::error::AppResult;
use crate::query::handlers as query;
use crate::state::AppState;
use crate::validation::ValidatedJson;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

// endregion: --- Imports

// region:    --- Categories

pub async fn handle_get_categories(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(query::get_categories(&state.db).await?))
}

pub async fn handle_create_category(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidatedJson(req): ValidatedJson<CategoryRequest>,
) -> AppResult<(StatusCode, Json<Category>)> {
    let category = commands::handle_create_category(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn handle_update_category(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(category_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<CategoryRequest>,
) -> AppResult<Json<Category>> {
    Ok(Json(
        commands::handle_update_category(&state.db, category_id, req).await?,
    ))
}

pub async fn handle_delete_category(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(category_id): Path<i64>,
) -> AppResult<StatusCode> {
    commands::handle_delete_category(&state.db, category_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// endregion: --- Categories

// region:    --- Products

/// 상품 목록. 상태를 지정하지 않으면 진행 중(ACTIVE)만
pub async fn handle_get_products(
    State(state): State<AppState>,
    Query(mut filter): Query<ProductFilter>,
) -> AppResult<Json<Page<Product>>> {
    if filter.status.is_none() {
        filter.status = Some("ACTIVE".to_string());
    }
    Ok(Json(query::list_products(&state.db, &filter).await?))
}

pub async fn handle_get_product(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> AppResult<Json<ProductDetail>> {
    Ok(Json(query::get_product_detail(&state.db, product_id).await?))
}

/// 상품 등록
pub async fn handle_create_product(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<Product>)> {
    info!("{:<12} --> 상품 등록 요청 seller: {}", "Command", user.id);
    let product = commands::handle_create_product(&state.db, user, req).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn handle_update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<CreateProductRequest>,
) -> AppResult<Json<Product>> {
    Ok(Json(
        commands::handle_update_product(&state.db, user, product_id, req).await?,
    ))
}

/// 상품 삭제 (판매자 입찰 전, 관리자)
pub async fn handle_delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<i64>,
) -> AppResult<Json<Product>> {
    Ok(Json(
        commands::handle_delete_product(&state.db, state.publisher.as_ref(), user, product_id)
            .await?,
    ))
}

/// 관리자 상품 삭제
pub async fn handle_admin_delete_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(product_id): Path<i64>,
) -> AppResult<Json<Product>> {
    Ok(Json(
        commands::handle_delete_product(&state.db, state.publisher.as_ref(), admin, product_id)
            .await?,
    ))
}

// endregion: --- Products
