use crate::users::model::User;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "올바른 이메일 형식이 아닙니다."))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "비밀번호는 8자 이상이어야 합니다."))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "이름은 1~100자여야 합니다."))]
    pub full_name: String,
    #[validate(length(max = 500))]
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "올바른 이메일 형식이 아닙니다."))]
    pub email: String,
    #[validate(length(min = 1, message = "비밀번호를 입력해주세요."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub user: User,
}

/// 이메일은 소문자로 저장/비교
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
