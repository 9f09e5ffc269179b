use crate::reviews::model::RatingView;
use crate::users::model::UserRole;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 관리자 통계
#[derive(Debug, Serialize)]
pub struct AdminStats {
    pub users_by_role: BTreeMap<String, i64>,
    pub products_by_status: BTreeMap<String, i64>,
    pub orders_by_status: BTreeMap<String, i64>,
    pub completed_revenue: i64,
}

/// 판매자 대시보드
#[derive(Debug, Serialize)]
pub struct SellerDashboard {
    pub products_by_status: BTreeMap<String, i64>,
    pub orders_by_status: BTreeMap<String, i64>,
    pub completed_revenue: i64,
    pub rating: RatingView,
}

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    #[serde(default)]
    pub seller_requests_only: bool,
    pub search: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

#[derive(Debug, Deserialize)]
pub struct UpdateActiveRequest {
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_list_query_defaults() {
        let query: UserListQuery = serde_json::from_str("{}").unwrap();
        assert!(!query.seller_requests_only);
        assert_eq!((query.page, query.page_size), (1, 20));
    }

    #[test]
    fn role_request_rejects_unknown_roles() {
        assert!(serde_json::from_str::<UpdateRoleRequest>(r#"{"role":"seller"}"#).is_ok());
        assert!(serde_json::from_str::<UpdateRoleRequest>(r#"{"role":"root"}"#).is_err());
    }
}
