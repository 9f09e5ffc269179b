// region:    --- Users

pub const GET_USER: &str = "SELECT id, email, password_hash, full_name, address, role, is_active, seller_requested_at, created_at FROM users WHERE id = $1";

pub const GET_USER_BY_EMAIL: &str = "SELECT id, email, password_hash, full_name, address, role, is_active, seller_requested_at, created_at FROM users WHERE email = $1";

/// 받은 평가 요약
pub const GET_RATING_SUMMARY: &str = r#"
    SELECT COUNT(*) FILTER (WHERE score > 0) AS positive,
           COUNT(*) FILTER (WHERE score < 0) AS negative
    FROM reviews
    WHERE reviewee_id = $1
"#;

/// 받은 평가 목록
pub const GET_USER_REVIEWS: &str = r#"
    SELECT r.id, r.order_id, r.reviewer_id, u.full_name AS reviewer_name, r.score, r.comment, r.created_at
    FROM reviews r
    JOIN users u ON u.id = r.reviewer_id
    WHERE r.reviewee_id = $1
    ORDER BY r.created_at DESC
"#;

/// 내가 입찰한 상품
pub const GET_MY_BIDS: &str = r#"
    SELECT p.id AS product_id, p.title, p.status, p.current_price, p.end_time,
           MAX(b.amount) AS my_highest_bid,
           COALESCE(p.highest_bidder_id = $1, FALSE) AS leading
    FROM bids b
    JOIN products p ON p.id = b.product_id
    WHERE b.bidder_id = $1
    GROUP BY p.id
    ORDER BY p.end_time DESC
"#;

/// 관심 상품
pub const GET_WATCHLIST: &str = r#"
    SELECT p.id, p.seller_id, p.category_id, p.title, p.description, p.image_urls, p.starting_price,
           p.current_price, p.bid_step, p.buy_now_price, p.start_time, p.end_time, p.status,
           p.auto_extend, p.allow_unrated_bidders, p.highest_bidder_id, p.bid_count, p.version, p.created_at
    FROM watchlist w
    JOIN products p ON p.id = w.product_id
    WHERE w.user_id = $1
    ORDER BY w.created_at DESC
"#;

// endregion: --- Users

// region:    --- Catalog

pub const GET_CATEGORIES: &str = "SELECT id, name, parent_id FROM categories ORDER BY name";

pub const PRODUCT_COLUMNS: &str = "p.id, p.seller_id, p.category_id, p.title, p.description, p.image_urls, p.starting_price, p.current_price, p.bid_step, p.buy_now_price, p.start_time, p.end_time, p.status, p.auto_extend, p.allow_unrated_bidders, p.highest_bidder_id, p.bid_count, p.version, p.created_at";

pub const GET_PRODUCT: &str = "SELECT id, seller_id, category_id, title, description, image_urls, starting_price, current_price, bid_step, buy_now_price, start_time, end_time, status, auto_extend, allow_unrated_bidders, highest_bidder_id, bid_count, version, created_at FROM products WHERE id = $1";

/// 최근 입찰 (입찰자 이름 포함)
pub const GET_RECENT_BIDS: &str = r#"
    SELECT b.id, b.bidder_id, u.full_name AS bidder_name, b.amount, b.is_auto, b.bid_time
    FROM bids b
    JOIN users u ON u.id = b.bidder_id
    WHERE b.product_id = $1
    ORDER BY b.amount DESC, b.bid_time DESC, b.id DESC
    LIMIT $2
"#;

/// 입찰 이력
pub const GET_BID_HISTORY: &str = r#"
    SELECT b.id, b.bidder_id, u.full_name AS bidder_name, b.amount, b.is_auto, b.bid_time
    FROM bids b
    JOIN users u ON u.id = b.bidder_id
    WHERE b.product_id = $1
    ORDER BY b.bid_time DESC, b.id DESC
"#;

/// 최고 입찰 조회 (거부된 입찰자 제외)
/// 같은 시각의 동률은 한 번의 판정에서 나중에 기록된 선두의 응찰이 앞선다
pub const GET_HIGHEST_BID: &str = r#"
    SELECT b.id, b.bidder_id, u.full_name AS bidder_name, b.amount, b.is_auto, b.bid_time
    FROM bids b
    JOIN users u ON u.id = b.bidder_id
    WHERE b.product_id = $1
      AND NOT EXISTS (
          SELECT 1 FROM rejected_bidders r
          WHERE r.product_id = b.product_id AND r.bidder_id = b.bidder_id
      )
    ORDER BY b.amount DESC, b.bid_time ASC, b.id DESC
    LIMIT 1
"#;

// endregion: --- Catalog

// region:    --- Orders

pub const GET_ORDER: &str = "SELECT id, product_id, buyer_id, seller_id, final_price, status, shipping_address, tracking_number, payment_intent_id, cancel_reason, payment_deadline, created_at, updated_at FROM orders WHERE id = $1";

/// 내 주문 목록. $2: 'buyer' | 'seller' | NULL, $3: 상태 | NULL
pub const GET_MY_ORDERS: &str = r#"
    SELECT o.id, o.product_id, p.title AS product_title, o.buyer_id, o.seller_id,
           o.final_price, o.status, o.created_at, o.updated_at
    FROM orders o
    JOIN products p ON p.id = o.product_id
    WHERE (($2::TEXT IS NULL AND (o.buyer_id = $1 OR o.seller_id = $1))
           OR ($2::TEXT = 'buyer' AND o.buyer_id = $1)
           OR ($2::TEXT = 'seller' AND o.seller_id = $1))
      AND ($3::TEXT IS NULL OR o.status = $3::TEXT)
    ORDER BY o.updated_at DESC
"#;

pub const GET_CHAT_MESSAGES: &str = r#"
    SELECT id, order_id, sender_id, content, created_at
    FROM chat_messages
    WHERE order_id = $1
    ORDER BY created_at ASC, id ASC
"#;

// endregion: --- Orders

// region:    --- Dashboards

pub const COUNT_USERS_BY_ROLE: &str =
    "SELECT role AS key, COUNT(*) AS count FROM users GROUP BY role";

pub const COUNT_PRODUCTS_BY_STATUS: &str =
    "SELECT status AS key, COUNT(*) AS count FROM products GROUP BY status";

pub const COUNT_ORDERS_BY_STATUS: &str =
    "SELECT status AS key, COUNT(*) AS count FROM orders GROUP BY status";

pub const COMPLETED_REVENUE: &str =
    "SELECT COALESCE(SUM(final_price), 0)::BIGINT FROM orders WHERE status = 'completed'";

pub const COUNT_SELLER_PRODUCTS_BY_STATUS: &str =
    "SELECT status AS key, COUNT(*) AS count FROM products WHERE seller_id = $1 GROUP BY status";

pub const COUNT_SELLER_ORDERS_BY_STATUS: &str =
    "SELECT status AS key, COUNT(*) AS count FROM orders WHERE seller_id = $1 GROUP BY status";

pub const SELLER_COMPLETED_REVENUE: &str = "SELECT COALESCE(SUM(final_price), 0)::BIGINT FROM orders WHERE seller_id = $1 AND status = 'completed'";

pub const GET_SELLER_ORDERS: &str = r#"
    SELECT o.id, o.product_id, p.title AS product_title, o.buyer_id, o.seller_id,
           o.final_price, o.status, o.created_at, o.updated_at
    FROM orders o
    JOIN products p ON p.id = o.product_id
    WHERE o.seller_id = $1
    ORDER BY o.updated_at DESC
"#;

// endregion: --- Dashboards
