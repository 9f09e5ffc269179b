/// 경매 종료 처리
/// 1. 낙찰 주문 생성 (즉시 구매, 종료 시점 최고 입찰자)
/// 2. 종료 시간 경과 경매 마감
/// 3. 예정 경매 시작
// region:    --- Imports
use crate::auction::events::MarketEvent;
use crate::catalog::model::Product;
use crate::database::DatabaseManager;
use crate::error::{AppError, AppResult};
use crate::event_store::{append_event, EventPublisher, StoredEvent};
use crate::orders::model::Order;
use crate::query::queries;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgConnection;
use tracing::info;

// endregion: --- Imports

/// 1. 낙찰 주문 생성
/// 결제 기한은 now + payment_deadline_hours
pub async fn create_order_for_sale(
    conn: &mut PgConnection,
    product: &Product,
    buyer_id: i64,
    final_price: i64,
    payment_deadline_hours: i64,
    now: DateTime<Utc>,
) -> AppResult<(Order, MarketEvent)> {
    let order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (product_id, buyer_id, seller_id, final_price, status, payment_deadline)
         VALUES ($1, $2, $3, $4, 'pending_payment', $5)
         ON CONFLICT (product_id) DO NOTHING
         RETURNING id, product_id, buyer_id, seller_id, final_price, status, shipping_address,
                   tracking_number, payment_intent_id, cancel_reason, payment_deadline, created_at, updated_at",
    )
    .bind(product.id)
    .bind(buyer_id)
    .bind(product.seller_id)
    .bind(final_price)
    .bind(now + Duration::hours(payment_deadline_hours))
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::Conflict("이미 주문이 생성된 상품입니다.".to_string()))?;

    // 낙찰 이후 자동 입찰은 의미 없음
    deactivate_auto_bids(conn, product.id).await?;

    info!(
        "{:<12} --> 주문 생성 order: {} product: {} buyer: {} price: {}",
        "Command", order.id, product.id, buyer_id, final_price
    );

    let event = MarketEvent::OrderCreated {
        order_id: order.id,
        product_id: product.id,
        buyer_id,
        seller_id: product.seller_id,
        final_price,
        timestamp: now,
    };
    Ok((order, event))
}

pub async fn deactivate_auto_bids(conn: &mut PgConnection, product_id: i64) -> AppResult<()> {
    sqlx::query(
        "UPDATE auto_bids SET is_active = FALSE, updated_at = NOW()
         WHERE product_id = $1 AND is_active",
    )
    .bind(product_id)
    .execute(conn)
    .await?;
    Ok(())
}

/// 2. 경매 마감
/// 상태 조건(ACTIVE, 종료 시간 경과)으로 갱신하므로 입찰/연장과 경합해도 한 번만 마감된다.
/// 마감하지 않았으면 None
pub async fn close_auction(
    db_manager: &DatabaseManager,
    publisher: &dyn EventPublisher,
    product_id: i64,
    payment_deadline_hours: i64,
) -> AppResult<Option<Product>> {
    let now = Utc::now();
    let mut tx = db_manager.pool().begin().await?;

    let closed = sqlx::query_as::<_, Product>(&format!(
        "UPDATE products p
         SET status = CASE WHEN p.highest_bidder_id IS NULL THEN 'ENDED' ELSE 'SOLD' END,
             version = p.version + 1
         WHERE p.id = $1 AND p.status = 'ACTIVE' AND p.end_time <= $2
         RETURNING {}",
        queries::PRODUCT_COLUMNS
    ))
    .bind(product_id)
    .bind(now)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(product) = closed else {
        return Ok(None);
    };

    let mut events = Vec::new();
    let closed_event = MarketEvent::AuctionClosed {
        product_id: product.id,
        winner_id: product.highest_bidder_id,
        final_price: product.highest_bidder_id.map(|_| product.current_price),
        timestamp: now,
    };
    events.push(append_event(&mut tx, &closed_event, None).await?);

    match product.highest_bidder_id {
        Some(winner_id) => {
            let (_, order_event) = create_order_for_sale(
                &mut tx,
                &product,
                winner_id,
                product.current_price,
                payment_deadline_hours,
                now,
            )
            .await?;
            events.push(append_event(&mut tx, &order_event, None).await?);
            info!(
                "{:<12} --> 경매 낙찰 product: {} winner: {} price: {}",
                "Scheduler", product.id, winner_id, product.current_price
            );
        }
        None => {
            deactivate_auto_bids(&mut tx, product.id).await?;
            info!("{:<12} --> 입찰 없이 경매 종료 product: {}", "Scheduler", product.id);
        }
    }

    tx.commit().await?;
    publisher.publish_all(&events).await;
    Ok(Some(product))
}

/// 3. 시작 시간이 된 예정 경매 시작
pub async fn activate_scheduled(
    db_manager: &DatabaseManager,
    now: DateTime<Utc>,
) -> AppResult<u64> {
    let result = sqlx::query(
        "UPDATE products SET status = 'ACTIVE', version = version + 1
         WHERE status = 'SCHEDULED' AND start_time <= $1",
    )
    .bind(now)
    .execute(db_manager.pool())
    .await?;
    Ok(result.rows_affected())
}

/// 종료 시간이 지난 진행 중 경매
pub async fn due_auctions(db_manager: &DatabaseManager, now: DateTime<Utc>) -> AppResult<Vec<i64>> {
    Ok(sqlx::query_scalar(
        "SELECT id FROM products WHERE status = 'ACTIVE' AND end_time <= $1 ORDER BY end_time",
    )
    .bind(now)
    .fetch_all(db_manager.pool())
    .await?)
}

/// 이벤트 목록 저장
pub async fn append_all(
    conn: &mut PgConnection,
    events: &[MarketEvent],
) -> AppResult<Vec<StoredEvent>> {
    let mut stored = Vec::with_capacity(events.len());
    for event in events {
        stored.push(append_event(conn, event, None).await?);
    }
    Ok(stored)
}
