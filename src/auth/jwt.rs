// region:    --- Imports
use crate::error::AppError;
use crate::users::model::UserRole;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

// endregion: --- Imports

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub role: UserRole,
    pub token_type: TokenType,
    pub iat: usize,
    pub exp: usize,
    /// 같은 초에 발급된 토큰도 서로 다르게
    pub jti: String,
}

pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtManager {
    pub fn new(secret: &str, access_minutes: i64, refresh_days: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl: Duration::minutes(access_minutes),
            refresh_ttl: Duration::days(refresh_days),
        }
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// 토큰 발급
    pub fn generate_token(
        &self,
        user_id: i64,
        role: UserRole,
        token_type: TokenType,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user_id,
            role,
            token_type,
            iat: now.timestamp() as usize,
            exp: (now + ttl).timestamp() as usize,
            jti: format!("{}-{}", user_id, now.timestamp_nanos_opt().unwrap_or_default()),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// 토큰 검증
    pub fn verify_token(&self, token: &str, expected: TokenType) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default()).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("토큰이 만료되었습니다.".to_string())
                }
                _ => AppError::Unauthorized("유효하지 않은 토큰입니다.".to_string()),
            },
        )?;

        if data.claims.token_type != expected {
            return Err(AppError::Unauthorized(
                "토큰 종류가 올바르지 않습니다.".to_string(),
            ));
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> JwtManager {
        JwtManager::new("test-secret-test-secret", 60, 7)
    }

    #[test]
    fn access_token_round_trip() {
        let jwt = manager();
        let token = jwt.generate_token(42, UserRole::Seller, TokenType::Access).unwrap();
        let claims = jwt.verify_token(&token, TokenType::Access).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, UserRole::Seller);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let jwt = manager();
        let token = jwt.generate_token(1, UserRole::Bidder, TokenType::Refresh).unwrap();
        assert!(matches!(
            jwt.verify_token(&token, TokenType::Access),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = JwtManager::new("test-secret-test-secret", -5, 7);
        let token = jwt.generate_token(1, UserRole::Bidder, TokenType::Access).unwrap();
        match jwt.verify_token(&token, TokenType::Access) {
            Err(AppError::Unauthorized(msg)) => assert!(msg.contains("만료")),
            other => panic!("expected expiry error, got {:?}", other.map(|c| c.sub)),
        }
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let other = JwtManager::new("another-secret-value", 60, 7);
        let token = other.generate_token(1, UserRole::Admin, TokenType::Access).unwrap();
        assert!(manager().verify_token(&token, TokenType::Access).is_err());
    }

    #[test]
    fn tokens_issued_back_to_back_differ() {
        let jwt = manager();
        let a = jwt.generate_token(1, UserRole::Bidder, TokenType::Refresh).unwrap();
        let b = jwt.generate_token(1, UserRole::Bidder, TokenType::Refresh).unwrap();
        assert_ne!(a, b);
    }
}
