use crate::error::AppError;
use bcrypt::{hash, verify};

/// bcrypt 비밀번호 해시
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let password = password.to_string();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || hash(password, cost))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
            .map_err(AppError::Bcrypt)
    }

    /// 일치하지 않으면 Unauthorized
    pub async fn compare_password(&self, hashed: &str, password: &str) -> Result<(), AppError> {
        let password = password.to_string();
        let hashed = hashed.to_string();
        let valid = tokio::task::spawn_blocking(move || verify(password, &hashed))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))??;

        if valid {
            Ok(())
        } else {
            Err(AppError::Unauthorized(
                "이메일 또는 비밀번호가 올바르지 않습니다.".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hasher = PasswordHasher::new(4);
        let hashed = hasher.hash_password("correct horse").await.unwrap();
        assert_ne!(hashed, "correct horse");
        assert!(hasher.compare_password(&hashed, "correct horse").await.is_ok());
        assert!(matches!(
            hasher.compare_password(&hashed, "wrong horse").await,
            Err(AppError::Unauthorized(_))
        ));
    }
}
