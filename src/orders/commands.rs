/// 주문 커맨드
/// 1. 구매자/판매자 상태 변경
/// 2. 결제 기한 초과 주문 취소 (스케줄러)
// region:    --- Imports
use crate::auction::events::MarketEvent;
use crate::auction::lifecycle::append_all;
use crate::auth::AuthUser;
use crate::database::DatabaseManager;
use crate::error::{AppError, AppResult};
use crate::event_store::EventPublisher;
use crate::orders::model::{Order, UpdateOrderRequest};
use crate::orders::status::{validate_transition, OrderActor, OrderStatus, TransitionPayload};
use crate::query::handlers as query;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::{info, warn};

// endregion: --- Imports

pub const PAYMENT_DEADLINE_REASON: &str = "payment deadline exceeded";
const NO_PURCHASE_REVIEW: &str = "낙찰자가 구매를 완료하지 않았습니다.";

/// 주문 당사자의 역할
pub fn actor_for(order: &Order, user_id: i64) -> Option<OrderActor> {
    if order.buyer_id == user_id {
        Some(OrderActor::Buyer)
    } else if order.seller_id == user_id {
        Some(OrderActor::Seller)
    } else {
        None
    }
}

/// 상태 전이 적용 (트랜잭션 안에서)
/// 판매자/시스템 취소는 낙찰자에게 부정 평가를 남긴다.
pub async fn apply_transition(
    conn: &mut PgConnection,
    order: &Order,
    to: OrderStatus,
    actor: OrderActor,
    payload: &TransitionPayload,
    now: DateTime<Utc>,
) -> AppResult<(Order, MarketEvent)> {
    let from = order.order_status()?;
    validate_transition(from, to, actor, payload)?;

    let updated = sqlx::query_as::<_, Order>(
        "UPDATE orders SET
            status = $1,
            shipping_address = COALESCE($2, shipping_address),
            tracking_number = COALESCE($3, tracking_number),
            cancel_reason = COALESCE($4, cancel_reason),
            payment_intent_id = COALESCE($5, payment_intent_id),
            updated_at = $6
         WHERE id = $7 AND status = $8
         RETURNING id, product_id, buyer_id, seller_id, final_price, status, shipping_address,
                   tracking_number, payment_intent_id, cancel_reason, payment_deadline, created_at, updated_at",
    )
    .bind(to.as_str())
    .bind(payload.shipping_address.as_deref())
    .bind(payload.tracking_number.as_deref())
    .bind(payload.cancel_reason.as_deref())
    .bind(payload.payment_intent_id.as_deref())
    .bind(now)
    .bind(order.id)
    .bind(from.as_str())
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::Conflict("주문 상태가 이미 변경되었습니다.".to_string()))?;

    if to == OrderStatus::Cancelled && actor != OrderActor::Buyer {
        sqlx::query(
            "INSERT INTO reviews (order_id, reviewer_id, reviewee_id, score, comment)
             VALUES ($1, $2, $3, -1, $4)
             ON CONFLICT (order_id, reviewer_id) DO NOTHING",
        )
        .bind(order.id)
        .bind(order.seller_id)
        .bind(order.buyer_id)
        .bind(NO_PURCHASE_REVIEW)
        .execute(&mut *conn)
        .await?;
    }

    info!(
        "{:<12} --> 주문 상태 변경 order: {} {} -> {} ({:?})",
        "Command", order.id, from, to, actor
    );

    let event = MarketEvent::OrderStatusChanged {
        order_id: updated.id,
        buyer_id: updated.buyer_id,
        seller_id: updated.seller_id,
        from: from.to_string(),
        to: to.to_string(),
        timestamp: now,
    };
    Ok((updated, event))
}

/// 1. 구매자/판매자 상태 변경
pub async fn handle_update_order(
    db_manager: &DatabaseManager,
    publisher: &dyn EventPublisher,
    user: AuthUser,
    order_id: i64,
    req: UpdateOrderRequest,
) -> AppResult<Order> {
    let to: OrderStatus = req.status.parse()?;
    let mut tx = db_manager.pool().begin().await?;

    let order = query::get_order(&mut *tx, order_id).await?;
    let actor = actor_for(&order, user.id)
        .ok_or_else(|| AppError::Forbidden("주문 당사자가 아닙니다.".to_string()))?;

    let (updated, event) =
        apply_transition(&mut tx, &order, to, actor, &req.payload(), Utc::now()).await?;
    let stored = append_all(&mut tx, &[event]).await?;
    tx.commit().await?;

    publisher.publish_all(&stored).await;
    Ok(updated)
}

/// 2. 결제 기한이 지난 주문 취소
pub async fn cancel_expired_orders(
    db_manager: &DatabaseManager,
    publisher: &dyn EventPublisher,
    now: DateTime<Utc>,
) -> AppResult<usize> {
    let expired: Vec<i64> = sqlx::query_scalar(
        "SELECT id FROM orders WHERE status = 'pending_payment' AND payment_deadline < $1",
    )
    .bind(now)
    .fetch_all(db_manager.pool())
    .await?;

    let mut cancelled = 0;
    for order_id in expired {
        let mut tx = db_manager.pool().begin().await?;
        let order = query::get_order(&mut *tx, order_id).await?;
        let payload = TransitionPayload {
            cancel_reason: Some(PAYMENT_DEADLINE_REASON.to_string()),
            ..TransitionPayload::default()
        };
        match apply_transition(
            &mut tx,
            &order,
            OrderStatus::Cancelled,
            OrderActor::System,
            &payload,
            now,
        )
        .await
        {
            Ok((_, event)) => {
                let stored = append_all(&mut tx, &[event]).await?;
                tx.commit().await?;
                publisher.publish_all(&stored).await;
                cancelled += 1;
            }
            // 그 사이 결제가 확인된 주문
            Err(AppError::Conflict(_)) | Err(AppError::Transition(_)) => {
                warn!("{:<12} --> 주문 {} 취소 건너뜀", "Scheduler", order_id);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(cancelled)
}
