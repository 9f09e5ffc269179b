// region:    --- Imports
use crate::auth::commands;
use crate::auth::model::{LoginRequest, RefreshRequest, RegisterRequest, TokenResponse};
use crate::error::AppResult;
use crate::state::AppState;
use crate::users::model::User;
use crate::validation::ValidatedJson;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

// endregion: --- Imports

/// 회원가입
pub async fn handle_register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = commands::register(&state.db, &state.hasher, req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// 로그인
pub async fn handle_login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    Ok(Json(
        commands::login(&state.db, &state.hasher, &state.jwt, req).await?,
    ))
}

/// 토큰 갱신
pub async fn handle_refresh(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> AppResult<Json<TokenResponse>> {
    Ok(Json(commands::refresh(&state.db, &state.jwt, req).await?))
}

/// 로그아웃
pub async fn handle_logout(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> AppResult<Json<Value>> {
    commands::logout(&state.db, req).await?;
    Ok(Json(json!({ "message": "로그아웃되었습니다." })))
}
