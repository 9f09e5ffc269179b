use crate::reviews::model::RatingView;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

// 사용자 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub address: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub seller_requested_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn user_role(&self) -> UserRole {
        self.role.parse().unwrap_or(UserRole::Bidder)
    }
}

/// 사용자 역할
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Bidder,
    Seller,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Bidder => "bidder",
            UserRole::Seller => "seller",
            UserRole::Admin => "admin",
        }
    }

    /// 상품 등록 가능 여부
    pub fn can_sell(&self) -> bool {
        matches!(self, UserRole::Seller | UserRole::Admin)
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bidder" => Ok(UserRole::Bidder),
            "seller" => Ok(UserRole::Seller),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("알 수 없는 역할: {}", other)),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 공개 프로필
#[derive(Debug, Serialize)]
pub struct PublicProfile {
    pub id: i64,
    pub full_name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub rating: RatingView,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "이름은 1~100자여야 합니다."))]
    pub full_name: String,
    #[validate(length(max = 500, message = "주소는 500자 이하여야 합니다."))]
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, max = 128, message = "비밀번호는 8자 이상이어야 합니다."))]
    pub new_password: String,
}

/// 내가 입찰한 상품
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct MyBidView {
    pub product_id: i64,
    pub title: String,
    pub status: String,
    pub current_price: i64,
    pub end_time: DateTime<Utc>,
    pub my_highest_bid: i64,
    pub leading: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_parse_and_gate_selling() {
        assert_eq!("seller".parse::<UserRole>().unwrap(), UserRole::Seller);
        assert!("root".parse::<UserRole>().is_err());
        assert!(UserRole::Admin.can_sell());
        assert!(!UserRole::Bidder.can_sell());
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: 1,
            email: "a@b.c".into(),
            password_hash: "$2b$secret".into(),
            full_name: "A".into(),
            address: None,
            role: "bidder".into(),
            is_active: true,
            seller_requested_at: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "a@b.c");
    }
}
