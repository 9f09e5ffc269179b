// region:    --- Imports
use crate::auction::settings::AuctionSettings;
use crate::auth::AdminUser;
use crate::catalog::model::Page;
use crate::dashboard::commands;
use crate::dashboard::model::{AdminStats, UpdateActiveRequest, UpdateRoleRequest, UserListQuery};
use crate::error::AppResult;
use crate::query::handlers as query;
use crate::state::AppState;
use crate::users::model::User;
use crate::validation::ValidatedJson;
use axum::extract::{Path, Query, State};
use axum::Json;

// endregion: --- Imports

pub async fn handle_stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<AdminStats>> {
    Ok(Json(query::get_admin_stats(&state.db).await?))
}

/// 사용자 목록 (seller_requests_only=true 면 판매자 전환 요청만)
pub async fn handle_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<UserListQuery>,
) -> AppResult<Json<Page<User>>> {
    Ok(Json(query::list_users(&state.db, &params).await?))
}

pub async fn handle_update_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateRoleRequest>,
) -> AppResult<Json<User>> {
    Ok(Json(
        commands::handle_update_role(&state.db, admin.id, user_id, req.role).await?,
    ))
}

pub async fn handle_update_active(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateActiveRequest>,
) -> AppResult<Json<User>> {
    Ok(Json(
        commands::handle_set_active(&state.db, admin.id, user_id, req.is_active).await?,
    ))
}

pub async fn handle_get_settings(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<AuctionSettings>> {
    Ok(Json(
        commands::handle_get_settings(&state.db, state.config.auction).await?,
    ))
}

pub async fn handle_update_settings(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidatedJson(settings): ValidatedJson<AuctionSettings>,
) -> AppResult<Json<AuctionSettings>> {
    Ok(Json(commands::handle_update_settings(&state.db, settings).await?))
}
