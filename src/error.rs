// region:    --- Imports
use crate::bidding::engine::BidRejection;
use crate::orders::status::TransitionError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

// endregion: --- Imports

pub type AppResult<T> = Result<T, AppError>;

/// API 공통 에러
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Bid(#[from] BidRejection),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Payment provider error: {0}")]
    Payment(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("Event bus error: {0}")]
    EventBus(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{}을(를) 찾을 수 없습니다.", what))
    }

    /// HTTP 상태 코드와 응답 코드 문자열
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Database(sqlx::Error::RowNotFound) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            AppError::Bid(rejection) => {
                let status = match rejection {
                    BidRejection::MaxRetriesExceeded => StatusCode::CONFLICT,
                    BidRejection::SellerCannotBid
                    | BidRejection::BidderRejected
                    | BidRejection::RatingTooLow { .. }
                    | BidRejection::UnratedNotAllowed => StatusCode::FORBIDDEN,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, rejection.code())
            }
            AppError::Transition(t) => (StatusCode::BAD_REQUEST, t.code()),
            AppError::Payment(_) => (StatusCode::BAD_GATEWAY, "PAYMENT_ERROR"),
            AppError::Jwt(_) => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            AppError::Bcrypt(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            AppError::EventBus(_) => (StatusCode::SERVICE_UNAVAILABLE, "EVENT_BUS_ERROR"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

/// PostgreSQL unique 제약 위반 (23505)
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // 내부 에러는 상세 내용을 노출하지 않는다
        let message = match &self {
            AppError::Database(sqlx::Error::RowNotFound) => "리소스를 찾을 수 없습니다.".to_string(),
            AppError::Database(_) | AppError::Bcrypt(_) | AppError::Internal(_) => {
                error!("{:<12} --> {:?}", "Error", self);
                "서버 내부 오류가 발생했습니다.".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": { "code": code, "message": message },
            "message": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::status::OrderStatus;

    #[test]
    fn bid_rejections_keep_their_codes() {
        let err = AppError::from(BidRejection::BelowMinimum { minimum: 1500 });
        assert_eq!(err.status_and_code(), (StatusCode::BAD_REQUEST, "LOW_BID"));

        let err = AppError::from(BidRejection::SellerCannotBid);
        assert_eq!(err.status_and_code().0, StatusCode::FORBIDDEN);

        let err = AppError::from(BidRejection::MaxRetriesExceeded);
        assert_eq!(
            err.status_and_code(),
            (StatusCode::CONFLICT, "MAX_RETRIES_EXCEEDED")
        );
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status_and_code().0, StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_transition_is_a_bad_request() {
        let err = AppError::from(TransitionError::NotAllowed {
            from: OrderStatus::PendingPayment,
            to: OrderStatus::Completed,
        });
        assert_eq!(
            err.status_and_code(),
            (StatusCode::BAD_REQUEST, "INVALID_TRANSITION")
        );
    }

    #[tokio::test]
    async fn response_body_carries_nested_and_flat_message() {
        let response = AppError::Conflict("이미 존재합니다.".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "CONFLICT");
        assert_eq!(body["error"]["message"], "이미 존재합니다.");
        assert_eq!(body["message"], "이미 존재합니다.");
    }
}
