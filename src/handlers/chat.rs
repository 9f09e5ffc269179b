// region:    --- Imports
use crate::auth::AuthUser;
use crate::chat::commands::{handle_list_messages, handle_send_message};
use crate::chat::model::{ChatMessage, SendMessageRequest};
use crate::error::AppResult;
use crate::state::AppState;
use crate::validation::ValidatedJson;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

// endregion: --- Imports

pub async fn handle_get_messages(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<i64>,
) -> AppResult<Json<Vec<ChatMessage>>> {
    Ok(Json(handle_list_messages(&state.db, user, order_id).await?))
}

pub async fn handle_post_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<SendMessageRequest>,
) -> AppResult<(StatusCode, Json<ChatMessage>)> {
    let message =
        handle_send_message(&state.db, state.publisher.as_ref(), user, order_id, req).await?;
    Ok((StatusCode::CREATED, Json(message)))
}
