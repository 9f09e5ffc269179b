// region:    --- Imports
use crate::auth::AuthUser;
use crate::database::DatabaseManager;
use crate::error::{AppError, AppResult};
use crate::orders::model::Order;
use crate::query::handlers as query;
use crate::reviews::model::{CreateReviewRequest, Review};
use tracing::info;

// endregion: --- Imports

/// 평가 대상: 주문의 상대방. 완료/취소된 주문만
pub fn reviewee_for(order: &Order, reviewer_id: i64) -> AppResult<i64> {
    let reviewee = if order.buyer_id == reviewer_id {
        order.seller_id
    } else if order.seller_id == reviewer_id {
        order.buyer_id
    } else {
        return Err(AppError::Forbidden("주문 당사자만 평가할 수 있습니다.".to_string()));
    };
    if !order.order_status()?.is_terminal() {
        return Err(AppError::BadRequest(
            "완료되거나 취소된 주문만 평가할 수 있습니다.".to_string(),
        ));
    }
    Ok(reviewee)
}

/// 평가 작성. 같은 주문에 다시 작성하면 수정된다.
pub async fn handle_create_review(
    db_manager: &DatabaseManager,
    user: AuthUser,
    order_id: i64,
    req: CreateReviewRequest,
) -> AppResult<Review> {
    let order = query::get_order(db_manager.pool(), order_id).await?;
    let reviewee_id = reviewee_for(&order, user.id)?;

    let review = sqlx::query_as::<_, Review>(
        "INSERT INTO reviews (order_id, reviewer_id, reviewee_id, score, comment)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (order_id, reviewer_id) DO UPDATE SET
            score = EXCLUDED.score,
            comment = EXCLUDED.comment,
            created_at = NOW()
         RETURNING id, order_id, reviewer_id, reviewee_id, score, comment, created_at",
    )
    .bind(order_id)
    .bind(user.id)
    .bind(reviewee_id)
    .bind(req.score)
    .bind(req.comment.trim())
    .fetch_one(db_manager.pool())
    .await?;

    info!(
        "{:<12} --> 평가 작성 order: {} {} -> {} ({})",
        "Command", order_id, user.id, reviewee_id, req.score
    );
    Ok(review)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn order(status: &str) -> Order {
        let now = Utc::now();
        Order {
            id: 1,
            product_id: 1,
            buyer_id: 10,
            seller_id: 20,
            final_price: 100,
            status: status.into(),
            shipping_address: None,
            tracking_number: None,
            payment_intent_id: None,
            cancel_reason: None,
            payment_deadline: now,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn each_party_reviews_the_other() {
        let order = order("completed");
        assert_eq!(reviewee_for(&order, 10).unwrap(), 20);
        assert_eq!(reviewee_for(&order, 20).unwrap(), 10);
        assert!(matches!(reviewee_for(&order, 30), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn open_orders_cannot_be_reviewed() {
        assert!(matches!(
            reviewee_for(&order("pending_shipping"), 10),
            Err(AppError::BadRequest(_))
        ));
        assert!(reviewee_for(&order("cancelled"), 10).is_ok());
    }
}
