// region:    --- Imports
use crate::auth::jwt::TokenType;
use crate::error::AppError;
use crate::state::AppState;
use crate::users::model::UserRole;
use axum::async_trait;
use axum::extract::{FromRequestParts, Query};
use axum::http::header;
use axum::http::request::Parts;
use std::collections::HashMap;

// endregion: --- Imports

/// 인증된 사용자
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// 판매자 권한 확인
    pub fn require_seller(&self) -> Result<(), AppError> {
        if self.role.can_sell() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "판매자 권한이 필요합니다.".to_string(),
            ))
        }
    }
}

/// Authorization 헤더의 Bearer 토큰, 없으면 token 쿼리 파라미터 (웹소켓)
fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .or_else(|| {
            Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
                .ok()
                .and_then(|Query(params)| params.get("token").cloned())
        })
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            AppError::Unauthorized("로그인이 필요합니다. 토큰을 제공해주세요.".to_string())
        })?;
        let claims = state.jwt.verify_token(&token, TokenType::Access)?;
        Ok(AuthUser {
            id: claims.sub,
            role: claims.role,
        })
    }
}

/// 관리자
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AppError::Forbidden("관리자 권한이 필요합니다.".to_string()));
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(req: Request<()>) -> Parts {
        req.into_parts().0
    }

    #[test]
    fn token_from_header_or_query() {
        let p = parts(
            Request::builder()
                .uri("/api/orders")
                .header("Authorization", "Bearer abc.def")
                .body(())
                .unwrap(),
        );
        assert_eq!(bearer_token(&p).as_deref(), Some("abc.def"));

        let p = parts(Request::builder().uri("/ws?token=xyz").body(()).unwrap());
        assert_eq!(bearer_token(&p).as_deref(), Some("xyz"));

        let p = parts(Request::builder().uri("/ws").body(()).unwrap());
        assert_eq!(bearer_token(&p), None);
    }
}
