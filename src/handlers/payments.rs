// region:    --- Imports
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::orders::model::Order;
use crate::payments::commands::{handle_confirm_payment, handle_create_intent};
use crate::payments::{ConfirmPaymentRequest, CreateIntentRequest, IntentResponse};
use crate::state::AppState;
use crate::validation::ValidatedJson;
use axum::extract::State;
use axum::Json;

// endregion: --- Imports

pub async fn handle_intent(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateIntentRequest>,
) -> AppResult<Json<IntentResponse>> {
    Ok(Json(
        handle_create_intent(&state.db, state.payments.as_ref(), user.id, req.order_id).await?,
    ))
}

pub async fn handle_confirm(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<ConfirmPaymentRequest>,
) -> AppResult<Json<Order>> {
    Ok(Json(
        handle_confirm_payment(
            &state.db,
            state.payments.as_ref(),
            state.publisher.as_ref(),
            &state.config.stripe.currency,
            user.id,
            req,
        )
        .await?,
    ))
}
