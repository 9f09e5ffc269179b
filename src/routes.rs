// region:    --- Imports
use crate::handlers::{self, admin, auth, bidding, catalog, chat, orders, payments, seller, users};
use crate::realtime::ws::ws_handler;
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

// endregion: --- Imports

const BODY_LIMIT: usize = 1024 * 1024 * 2;

/// 전체 라우터
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // auth
        .route("/auth/register", post(auth::handle_register))
        .route("/auth/login", post(auth::handle_login))
        .route("/auth/refresh", post(auth::handle_refresh))
        .route("/auth/logout", post(auth::handle_logout))
        // users
        .route("/users/me", get(users::handle_get_me).put(users::handle_update_me))
        .route("/users/me/password", put(users::handle_change_password))
        .route("/users/me/seller-request", post(users::handle_seller_request))
        .route("/users/me/watchlist", get(users::handle_get_watchlist))
        .route(
            "/users/me/watchlist/:product_id",
            post(users::handle_add_watch).delete(users::handle_remove_watch),
        )
        .route("/users/me/bids", get(users::handle_my_bids))
        .route("/users/me/won", get(users::handle_my_won))
        .route("/users/:id", get(users::handle_get_profile))
        .route("/users/:id/reviews", get(users::handle_get_reviews))
        // catalog
        .route(
            "/categories",
            get(catalog::handle_get_categories).post(catalog::handle_create_category),
        )
        .route(
            "/categories/:id",
            put(catalog::handle_update_category).delete(catalog::handle_delete_category),
        )
        .route(
            "/products",
            get(catalog::handle_get_products).post(catalog::handle_create_product),
        )
        .route(
            "/products/:id",
            get(catalog::handle_get_product)
                .put(catalog::handle_update_product)
                .delete(catalog::handle_delete_product),
        )
        // bidding
        .route("/products/:id/bids", get(bidding::handle_get_bid_history))
        .route("/products/:id/highest-bid", get(bidding::handle_get_highest_bid))
        .route("/products/:id/buy-now", post(bidding::handle_buy_now))
        .route("/products/:id/reject-bidder", post(bidding::handle_reject))
        .route("/bids", post(bidding::handle_place_bid))
        .route("/auto-bids", post(bidding::handle_auto_bid))
        .route("/auto-bids/:product_id", delete(bidding::handle_delete_auto_bid))
        // orders
        .route("/orders", get(orders::handle_get_orders))
        .route("/orders/:id", get(orders::handle_get_order).put(orders::handle_update))
        .route("/orders/:id/reviews", post(orders::handle_review))
        // payments
        .route("/payments/intent", post(payments::handle_intent))
        .route("/payments/confirm", post(payments::handle_confirm))
        // chat
        .route(
            "/chat/orders/:order_id/messages",
            get(chat::handle_get_messages).post(chat::handle_post_message),
        )
        // admin
        .route("/admin/stats", get(admin::handle_stats))
        .route("/admin/users", get(admin::handle_users))
        .route("/admin/users/:id/role", put(admin::handle_update_role))
        .route("/admin/users/:id/active", put(admin::handle_update_active))
        .route(
            "/admin/settings",
            get(admin::handle_get_settings).put(admin::handle_update_settings),
        )
        .route("/admin/products/:id", delete(catalog::handle_admin_delete_product))
        // seller
        .route("/seller/dashboard", get(seller::handle_dashboard))
        .route("/seller/products", get(seller::handle_products))
        .route("/seller/orders", get(seller::handle_orders));

    Router::new()
        .route("/health", get(handlers::handle_health))
        .route("/ws", get(ws_handler))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
