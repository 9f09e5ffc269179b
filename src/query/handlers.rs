// region:    --- Imports
use super::queries;
use crate::auction::status::AuctionStatus;
use crate::bidding::model::BidView;
use crate::catalog::model::{Category, Page, Product, ProductDetail, ProductFilter};
use crate::chat::model::ChatMessage;
use crate::dashboard::model::{AdminStats, SellerDashboard, UserListQuery};
use crate::database::DatabaseManager;
use crate::error::{AppError, AppResult};
use crate::orders::model::{Order, OrderRoleFilter, OrderSummary};
use crate::reviews::model::{RatingSummary, ReviewView};
use crate::users::model::{MyBidView, PublicProfile, User};
use sqlx::{Executor, Postgres, QueryBuilder};
use std::collections::BTreeMap;
use tracing::info;

// endregion: --- Imports

const MAX_PAGE_SIZE: i64 = 100;
const MAX_PAGE: i64 = 10_000;
const RECENT_BID_LIMIT: i64 = 10;

// region:    --- Users

pub async fn get_user<'e, E>(executor: E, user_id: i64) -> AppResult<User>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, User>(queries::GET_USER)
        .bind(user_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::not_found("사용자"))
}

pub async fn find_user_by_email(
    db_manager: &DatabaseManager,
    email: &str,
) -> AppResult<Option<User>> {
    Ok(sqlx::query_as::<_, User>(queries::GET_USER_BY_EMAIL)
        .bind(email)
        .fetch_optional(db_manager.pool())
        .await?)
}

/// 평가 요약 조회
pub async fn get_rating_summary<'e, E>(executor: E, user_id: i64) -> AppResult<RatingSummary>
where
    E: Executor<'e, Database = Postgres>,
{
    Ok(sqlx::query_as::<_, RatingSummary>(queries::GET_RATING_SUMMARY)
        .bind(user_id)
        .fetch_one(executor)
        .await?)
}

/// 공개 프로필 조회
pub async fn get_public_profile(
    db_manager: &DatabaseManager,
    user_id: i64,
) -> AppResult<PublicProfile> {
    info!("{:<12} --> 프로필 조회 id: {}", "Query", user_id);
    let user = get_user(db_manager.pool(), user_id).await?;
    let rating = get_rating_summary(db_manager.pool(), user_id).await?;
    Ok(PublicProfile {
        id: user.id,
        full_name: user.full_name,
        role: user.role,
        created_at: user.created_at,
        rating: rating.into(),
    })
}

pub async fn get_user_reviews(
    db_manager: &DatabaseManager,
    user_id: i64,
) -> AppResult<Vec<ReviewView>> {
    Ok(sqlx::query_as::<_, ReviewView>(queries::GET_USER_REVIEWS)
        .bind(user_id)
        .fetch_all(db_manager.pool())
        .await?)
}

/// 입찰자 대시보드: 내가 입찰한 상품
pub async fn get_my_bids(db_manager: &DatabaseManager, user_id: i64) -> AppResult<Vec<MyBidView>> {
    info!("{:<12} --> 내 입찰 조회 user: {}", "Query", user_id);
    Ok(sqlx::query_as::<_, MyBidView>(queries::GET_MY_BIDS)
        .bind(user_id)
        .fetch_all(db_manager.pool())
        .await?)
}

pub async fn get_watchlist(db_manager: &DatabaseManager, user_id: i64) -> AppResult<Vec<Product>> {
    Ok(sqlx::query_as::<_, Product>(queries::GET_WATCHLIST)
        .bind(user_id)
        .fetch_all(db_manager.pool())
        .await?)
}

/// 관리자 사용자 목록
pub async fn list_users(
    db_manager: &DatabaseManager,
    query: &UserListQuery,
) -> AppResult<Page<User>> {
    let (page, page_size) = clamp_paging(query.page, query.page_size);

    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users u");
    push_user_filters(&mut count, query);
    let total: i64 = count.build_query_scalar().fetch_one(db_manager.pool()).await?;

    let mut select = QueryBuilder::<Postgres>::new(
        "SELECT u.id, u.email, u.password_hash, u.full_name, u.address, u.role, u.is_active, u.seller_requested_at, u.created_at FROM users u",
    );
    push_user_filters(&mut select, query);
    select
        .push(" ORDER BY u.seller_requested_at DESC NULLS LAST, u.id ASC LIMIT ")
        .push_bind(page_size)
        .push(" OFFSET ")
        .push_bind((page - 1) * page_size);
    let items = select.build_query_as::<User>().fetch_all(db_manager.pool()).await?;

    Ok(Page { items, page, page_size, total })
}

fn push_user_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &UserListQuery) {
    builder.push(" WHERE 1 = 1");
    if query.seller_requests_only {
        builder.push(" AND u.seller_requested_at IS NOT NULL AND u.role = 'bidder'");
    }
    if let Some(search) = non_empty(&query.search) {
        let pattern = format!("%{}%", escape_like(search));
        builder
            .push(" AND (u.email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.full_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

// endregion: --- Users

// region:    --- Catalog

pub async fn get_categories(db_manager: &DatabaseManager) -> AppResult<Vec<Category>> {
    Ok(sqlx::query_as::<_, Category>(queries::GET_CATEGORIES)
        .fetch_all(db_manager.pool())
        .await?)
}

pub async fn get_product<'e, E>(executor: E, product_id: i64) -> AppResult<Product>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, Product>(queries::GET_PRODUCT)
        .bind(product_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::not_found("상품"))
}

/// 상품 목록 (검색, 필터, 정렬, 페이지)
pub async fn list_products(
    db_manager: &DatabaseManager,
    filter: &ProductFilter,
) -> AppResult<Page<Product>> {
    info!("{:<12} --> 상품 목록 조회 {:?}", "Query", filter);
    let (page, page_size) = clamp_paging(filter.page, filter.page_size);

    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products p");
    push_product_filters(&mut count, filter)?;
    let total: i64 = count.build_query_scalar().fetch_one(db_manager.pool()).await?;

    let mut select = QueryBuilder::<Postgres>::new(format!(
        "SELECT {} FROM products p",
        queries::PRODUCT_COLUMNS
    ));
    push_product_filters(&mut select, filter)?;
    select
        .push(" ORDER BY ")
        .push(filter.sort.order_by())
        .push(", p.id DESC LIMIT ")
        .push_bind(page_size)
        .push(" OFFSET ")
        .push_bind((page - 1) * page_size);
    let items = select.build_query_as::<Product>().fetch_all(db_manager.pool()).await?;

    Ok(Page { items, page, page_size, total })
}

/// 상품 목록 WHERE 절. status 가 "all" 이면 상태 조건 없음
fn push_product_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    filter: &ProductFilter,
) -> AppResult<()> {
    builder.push(" WHERE 1 = 1");
    if let Some(search) = non_empty(&filter.search) {
        builder
            .push(" AND p.title ILIKE ")
            .push_bind(format!("%{}%", escape_like(search)));
    }
    if let Some(category_id) = filter.category_id {
        // 하위 카테고리 포함
        builder
            .push(" AND (p.category_id = ")
            .push_bind(category_id)
            .push(" OR p.category_id IN (SELECT id FROM categories WHERE parent_id = ")
            .push_bind(category_id)
            .push("))");
    }
    match non_empty(&filter.status) {
        None => {}
        Some(raw) if raw.eq_ignore_ascii_case("all") => {}
        Some(raw) => {
            let status: AuctionStatus = raw.parse().map_err(AppError::BadRequest)?;
            builder.push(" AND p.status = ").push_bind(status.as_str());
        }
    }
    if let Some(seller_id) = filter.seller_id {
        builder.push(" AND p.seller_id = ").push_bind(seller_id);
    }
    Ok(())
}

/// 상품 상세 (판매자 평가, 최근 입찰)
pub async fn get_product_detail(
    db_manager: &DatabaseManager,
    product_id: i64,
) -> AppResult<ProductDetail> {
    info!("{:<12} --> 상품 상세 조회 id: {}", "Query", product_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let product = get_product(&mut **tx, product_id).await?;
                let seller = get_user(&mut **tx, product.seller_id).await?;
                let rating = get_rating_summary(&mut **tx, product.seller_id).await?;
                let recent_bids = sqlx::query_as::<_, BidView>(queries::GET_RECENT_BIDS)
                    .bind(product_id)
                    .bind(RECENT_BID_LIMIT)
                    .fetch_all(&mut **tx)
                    .await?
                    .into_iter()
                    .map(BidView::masked)
                    .collect();
                let minimum_bid = match product.highest_bidder_id {
                    None => product.starting_price,
                    Some(_) => product.current_price + product.bid_step,
                };
                Ok::<_, AppError>(ProductDetail {
                    product,
                    seller_name: seller.full_name,
                    seller_rating: rating.into(),
                    recent_bids,
                    minimum_bid,
                })
            })
        })
        .await
}

/// 입찰 이력 조회
pub async fn get_bid_history(
    db_manager: &DatabaseManager,
    product_id: i64,
) -> AppResult<Vec<BidView>> {
    info!("{:<12} --> 입찰 이력 조회 id: {}", "Query", product_id);
    get_product(db_manager.pool(), product_id).await?;
    Ok(sqlx::query_as::<_, BidView>(queries::GET_BID_HISTORY)
        .bind(product_id)
        .fetch_all(db_manager.pool())
        .await?
        .into_iter()
        .map(BidView::masked)
        .collect())
}

/// 최고 입찰가 조회
pub async fn get_highest_bid(
    db_manager: &DatabaseManager,
    product_id: i64,
) -> AppResult<Option<BidView>> {
    info!("{:<12} --> 최고 입찰가 조회 id: {}", "Query", product_id);
    get_product(db_manager.pool(), product_id).await?;
    Ok(sqlx::query_as::<_, BidView>(queries::GET_HIGHEST_BID)
        .bind(product_id)
        .fetch_optional(db_manager.pool())
        .await?
        .map(BidView::masked))
}

// endregion: --- Catalog

// region:    --- Orders

pub async fn get_order<'e, E>(executor: E, order_id: i64) -> AppResult<Order>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, Order>(queries::GET_ORDER)
        .bind(order_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::not_found("주문"))
}

pub async fn get_my_orders(
    db_manager: &DatabaseManager,
    user_id: i64,
    role: Option<OrderRoleFilter>,
    status: Option<&str>,
) -> AppResult<Vec<OrderSummary>> {
    let role = role.map(|r| match r {
        OrderRoleFilter::Buyer => "buyer",
        OrderRoleFilter::Seller => "seller",
    });
    Ok(sqlx::query_as::<_, OrderSummary>(queries::GET_MY_ORDERS)
        .bind(user_id)
        .bind(role)
        .bind(status)
        .fetch_all(db_manager.pool())
        .await?)
}

pub async fn get_chat_messages(
    db_manager: &DatabaseManager,
    order_id: i64,
) -> AppResult<Vec<ChatMessage>> {
    Ok(sqlx::query_as::<_, ChatMessage>(queries::GET_CHAT_MESSAGES)
        .bind(order_id)
        .fetch_all(db_manager.pool())
        .await?)
}

// endregion: --- Orders

// region:    --- Dashboards

async fn count_by_key(
    db_manager: &DatabaseManager,
    sql: &'static str,
    owner_id: Option<i64>,
) -> AppResult<BTreeMap<String, i64>> {
    let mut query = sqlx::query_as::<_, (String, i64)>(sql);
    if let Some(owner_id) = owner_id {
        query = query.bind(owner_id);
    }
    Ok(query.fetch_all(db_manager.pool()).await?.into_iter().collect())
}

/// 관리자 통계
pub async fn get_admin_stats(db_manager: &DatabaseManager) -> AppResult<AdminStats> {
    info!("{:<12} --> 관리자 통계 조회", "Query");
    Ok(AdminStats {
        users_by_role: count_by_key(db_manager, queries::COUNT_USERS_BY_ROLE, None).await?,
        products_by_status: count_by_key(db_manager, queries::COUNT_PRODUCTS_BY_STATUS, None)
            .await?,
        orders_by_status: count_by_key(db_manager, queries::COUNT_ORDERS_BY_STATUS, None).await?,
        completed_revenue: sqlx::query_scalar(queries::COMPLETED_REVENUE)
            .fetch_one(db_manager.pool())
            .await?,
    })
}

/// 판매자 대시보드
pub async fn get_seller_dashboard(
    db_manager: &DatabaseManager,
    seller_id: i64,
) -> AppResult<SellerDashboard> {
    info!("{:<12} --> 판매자 대시보드 조회 seller: {}", "Query", seller_id);
    Ok(SellerDashboard {
        products_by_status: count_by_key(
            db_manager,
            queries::COUNT_SELLER_PRODUCTS_BY_STATUS,
            Some(seller_id),
        )
        .await?,
        orders_by_status: count_by_key(
            db_manager,
            queries::COUNT_SELLER_ORDERS_BY_STATUS,
            Some(seller_id),
        )
        .await?,
        completed_revenue: sqlx::query_scalar(queries::SELLER_COMPLETED_REVENUE)
            .bind(seller_id)
            .fetch_one(db_manager.pool())
            .await?,
        rating: get_rating_summary(db_manager.pool(), seller_id).await?.into(),
    })
}

pub async fn get_seller_orders(
    db_manager: &DatabaseManager,
    seller_id: i64,
) -> AppResult<Vec<OrderSummary>> {
    Ok(sqlx::query_as::<_, OrderSummary>(queries::GET_SELLER_ORDERS)
        .bind(seller_id)
        .fetch_all(db_manager.pool())
        .await?)
}

// endregion: --- Dashboards

// region:    --- Helpers

fn clamp_paging(page: i64, page_size: i64) -> (i64, i64) {
    (page.clamp(1, MAX_PAGE), page_size.clamp(1, MAX_PAGE_SIZE))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// LIKE 패턴 특수문자 이스케이프
fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

// endregion: --- Helpers

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::ProductSort;

    fn product_sql(filter: &ProductFilter) -> String {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM products p");
        push_product_filters(&mut builder, filter).unwrap();
        builder.sql().to_string()
    }

    #[test]
    fn empty_filter_has_no_conditions() {
        assert_eq!(
            product_sql(&ProductFilter::default()),
            "SELECT * FROM products p WHERE 1 = 1"
        );
    }

    #[test]
    fn filters_bind_their_values() {
        let filter = ProductFilter {
            search: Some("camera".into()),
            category_id: Some(3),
            status: Some("active".into()),
            seller_id: Some(9),
            sort: ProductSort::PriceDesc,
            ..ProductFilter::default()
        };
        let sql = product_sql(&filter);
        assert!(sql.contains("p.title ILIKE $1"));
        assert!(sql.contains("p.category_id = $2"));
        assert!(sql.contains("parent_id = $3"));
        assert!(sql.contains("p.status = $4"));
        assert!(sql.contains("p.seller_id = $5"));
    }

    #[test]
    fn all_status_skips_the_status_condition() {
        let filter = ProductFilter {
            status: Some("ALL".into()),
            ..ProductFilter::default()
        };
        assert!(!product_sql(&filter).contains("p.status"));
    }

    #[test]
    fn unknown_status_is_a_bad_request() {
        let filter = ProductFilter {
            status: Some("flying".into()),
            ..ProductFilter::default()
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1");
        assert!(matches!(
            push_product_filters(&mut builder, &filter),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn paging_is_clamped() {
        assert_eq!(clamp_paging(0, 1000), (1, MAX_PAGE_SIZE));
        assert_eq!(clamp_paging(3, 0), (3, 1));
    }

    #[test]
    fn huge_page_keeps_the_offset_in_range() {
        let (page, page_size) = clamp_paging(i64::MAX, i64::MAX);
        assert_eq!((page, page_size), (MAX_PAGE, MAX_PAGE_SIZE));
        assert!((page - 1).checked_mul(page_size).is_some());

        let (page, _) = clamp_paging(i64::MIN, 20);
        assert_eq!(page, 1);
    }

    #[test]
    fn highest_bid_skips_rejected_bidders_and_breaks_ties() {
        let sql = queries::GET_HIGHEST_BID;
        assert!(sql.contains("rejected_bidders"));
        assert!(sql.contains("ORDER BY b.amount DESC, b.bid_time ASC, b.id DESC"));
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
    }
}
