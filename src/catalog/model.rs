use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

// 카테고리 모델
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
}

// 상품 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub seller_id: i64,
    pub category_id: i64,
    pub title: String,
    pub description: String,
    pub image_urls: Vec<String>,
    pub starting_price: i64,
    pub current_price: i64,
    pub bid_step: i64,
    pub buy_now_price: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub auto_extend: bool,
    pub allow_unrated_bidders: bool,
    pub highest_bidder_id: Option<i64>,
    pub bid_count: i64,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100, message = "카테고리 이름은 1~100자여야 합니다."))]
    pub name: String,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_listing"))]
pub struct CreateProductRequest {
    #[validate(range(min = 1, message = "카테고리를 선택해야 합니다."))]
    pub category_id: i64,
    #[validate(length(min = 1, max = 200, message = "제목은 1~200자여야 합니다."))]
    pub title: String,
    #[validate(length(min = 1, max = 10000, message = "설명을 입력해야 합니다."))]
    pub description: String,
    #[serde(default)]
    #[validate(length(max = 10, message = "이미지는 최대 10개입니다."))]
    pub image_urls: Vec<String>,
    #[validate(range(
        min = 1,
        max = 1_000_000_000_000i64,
        message = "시작가는 1 ~ 1조 사이여야 합니다."
    ))]
    pub starting_price: i64,
    #[validate(range(
        min = 1,
        max = 1_000_000_000_000i64,
        message = "입찰 단위는 1 ~ 1조 사이여야 합니다."
    ))]
    pub bid_step: i64,
    pub buy_now_price: Option<i64>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub auto_extend: bool,
    #[serde(default = "default_true")]
    pub allow_unrated_bidders: bool,
}

fn default_true() -> bool {
    true
}

/// 금액 필드의 상한 (1조)
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

fn validate_listing(req: &CreateProductRequest) -> Result<(), ValidationError> {
    if let Some(buy_now) = req.buy_now_price {
        if buy_now <= req.starting_price {
            let mut err = ValidationError::new("buy_now_price");
            err.message = Some("즉시 구매가는 시작가보다 높아야 합니다.".into());
            return Err(err);
        }
        if buy_now > MAX_AMOUNT {
            let mut err = ValidationError::new("buy_now_price");
            err.message = Some("즉시 구매가는 1조를 넘을 수 없습니다.".into());
            return Err(err);
        }
    }
    let start = req.start_time.unwrap_or_else(Utc::now);
    if req.end_time <= start {
        let mut err = ValidationError::new("end_time");
        err.message = Some("종료 시간은 시작 시간 이후여야 합니다.".into());
        return Err(err);
    }
    if req.end_time <= Utc::now() {
        let mut err = ValidationError::new("end_time");
        err.message = Some("종료 시간은 현재 이후여야 합니다.".into());
        return Err(err);
    }
    Ok(())
}

/// 상품 목록 조회 조건
#[derive(Debug, Clone, Deserialize)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub status: Option<String>,
    pub seller_id: Option<i64>,
    #[serde(default)]
    pub sort: ProductSort,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            search: None,
            category_id: None,
            status: None,
            seller_id: None,
            sort: ProductSort::default(),
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    EndingSoon,
    PriceAsc,
    PriceDesc,
    Newest,
    MostBids,
}

impl ProductSort {
    pub fn order_by(&self) -> &'static str {
        match self {
            ProductSort::EndingSoon => "p.end_time ASC",
            ProductSort::PriceAsc => "p.current_price ASC",
            ProductSort::PriceDesc => "p.current_price DESC",
            ProductSort::Newest => "p.created_at DESC",
            ProductSort::MostBids => "p.bid_count DESC",
        }
    }
}

/// 페이지 응답
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}

/// 상품 상세 (판매자 평가, 최근 입찰 포함)
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub seller_name: String,
    pub seller_rating: crate::reviews::model::RatingView,
    pub recent_bids: Vec<crate::bidding::model::BidView>,
    pub minimum_bid: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn request() -> CreateProductRequest {
        CreateProductRequest {
            category_id: 1,
            title: "Vintage camera".into(),
            description: "Works fine".into(),
            image_urls: vec![],
            starting_price: 1000,
            bid_step: 100,
            buy_now_price: Some(5000),
            start_time: None,
            end_time: Utc::now() + Duration::days(3),
            auto_extend: true,
            allow_unrated_bidders: true,
        }
    }

    #[test]
    fn valid_listing_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn buy_now_must_exceed_starting_price() {
        let mut req = request();
        req.buy_now_price = Some(1000);
        assert!(req.validate().is_err());
    }

    #[test]
    fn end_time_must_follow_start_and_now() {
        let mut req = request();
        req.start_time = Some(Utc::now() + Duration::days(5));
        assert!(req.validate().is_err());

        let mut req = request();
        req.end_time = Utc::now() - Duration::minutes(1);
        assert!(req.validate().is_err());
    }

    #[test]
    fn prices_must_be_positive() {
        let mut req = request();
        req.bid_step = 0;
        assert!(req.validate().is_err());
    }

    #[test]
    fn prices_are_capped() {
        let mut req = request();
        req.bid_step = i64::MAX;
        assert!(req.validate().is_err());

        let mut req = request();
        req.starting_price = MAX_AMOUNT + 1;
        req.buy_now_price = None;
        assert!(req.validate().is_err());

        let mut req = request();
        req.buy_now_price = Some(MAX_AMOUNT + 1);
        assert!(req.validate().is_err());

        let mut req = request();
        req.starting_price = MAX_AMOUNT - 1;
        req.bid_step = MAX_AMOUNT;
        req.buy_now_price = Some(MAX_AMOUNT);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn sort_defaults_to_ending_soon() {
        let filter: ProductFilter = serde_json::from_str("{}").unwrap();
        assert_eq!(filter.sort, ProductSort::EndingSoon);
        assert_eq!(filter.page, 1);
        assert_eq!(filter.page_size, 20);
    }
}
