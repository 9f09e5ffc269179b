/// 주문별 구매자-판매자 채팅
// region:    --- Imports
use crate::auction::events::MarketEvent;
use crate::auction::lifecycle::append_all;
use crate::auth::AuthUser;
use crate::chat::model::{ChatMessage, SendMessageRequest};
use crate::database::DatabaseManager;
use crate::error::{AppError, AppResult};
use crate::event_store::EventPublisher;
use crate::orders::model::Order;
use crate::query::handlers as query;
use tracing::info;

// endregion: --- Imports

/// 관리자는 주문 조회(allow_admin)만 가능하고 채팅과 주문 방에는 들어올 수 없다
pub fn can_access_order(order: &Order, user: &AuthUser, allow_admin: bool) -> bool {
    order.is_party(user.id) || (allow_admin && user.is_admin())
}

/// 주문 당사자(또는 관리자 열람)만
pub async fn authorized_order(
    db_manager: &DatabaseManager,
    user: AuthUser,
    order_id: i64,
    allow_admin: bool,
) -> AppResult<Order> {
    let order = query::get_order(db_manager.pool(), order_id).await?;
    if can_access_order(&order, &user, allow_admin) {
        Ok(order)
    } else {
        Err(AppError::Forbidden("주문 당사자만 접근할 수 있습니다.".to_string()))
    }
}

pub async fn handle_list_messages(
    db_manager: &DatabaseManager,
    user: AuthUser,
    order_id: i64,
) -> AppResult<Vec<ChatMessage>> {
    authorized_order(db_manager, user, order_id, false).await?;
    query::get_chat_messages(db_manager, order_id).await
}

pub async fn handle_send_message(
    db_manager: &DatabaseManager,
    publisher: &dyn EventPublisher,
    user: AuthUser,
    order_id: i64,
    req: SendMessageRequest,
) -> AppResult<ChatMessage> {
    authorized_order(db_manager, user, order_id, false).await?;
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(AppError::Validation("content: 메시지를 입력해주세요.".to_string()));
    }

    let mut tx = db_manager.pool().begin().await?;
    let message = sqlx::query_as::<_, ChatMessage>(
        "INSERT INTO chat_messages (order_id, sender_id, content) VALUES ($1, $2, $3)
         RETURNING id, order_id, sender_id, content, created_at",
    )
    .bind(order_id)
    .bind(user.id)
    .bind(&content)
    .fetch_one(&mut *tx)
    .await?;

    let event = MarketEvent::ChatMessageSent {
        message_id: message.id,
        order_id,
        sender_id: user.id,
        content,
        timestamp: message.created_at,
    };
    let stored = append_all(&mut tx, &[event]).await?;
    tx.commit().await?;

    info!("{:<12} --> 채팅 메시지 order: {} sender: {}", "Command", order_id, user.id);
    publisher.publish_all(&stored).await;
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::model::UserRole;
    use chrono::Utc;

    fn order() -> Order {
        let now = Utc::now();
        Order {
            id: 3,
            product_id: 1,
            buyer_id: 5,
            seller_id: 6,
            final_price: 2500,
            status: "pending_payment".into(),
            shipping_address: None,
            tracking_number: None,
            payment_intent_id: None,
            cancel_reason: None,
            payment_deadline: now,
            created_at: now,
            updated_at: now,
        }
    }

    fn user(id: i64, role: UserRole) -> AuthUser {
        AuthUser { id, role }
    }

    #[test]
    fn parties_reach_chat_and_order() {
        let order = order();
        for party in [user(5, UserRole::Bidder), user(6, UserRole::Seller)] {
            assert!(can_access_order(&order, &party, false));
            assert!(can_access_order(&order, &party, true));
        }
    }

    #[test]
    fn admin_reads_the_order_but_not_the_chat() {
        let order = order();
        let admin = user(1, UserRole::Admin);
        assert!(can_access_order(&order, &admin, true));
        assert!(!can_access_order(&order, &admin, false));
    }

    #[test]
    fn strangers_are_kept_out() {
        let order = order();
        let stranger = user(9, UserRole::Bidder);
        assert!(!can_access_order(&order, &stranger, true));
        assert!(!can_access_order(&order, &stranger, false));
    }
}
