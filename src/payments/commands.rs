/// 결제 커맨드
/// 1. PaymentIntent 생성 (구매자, 결제 대기 주문)
/// 2. 결제 확인 → pending_address
// region:    --- Imports
use crate::auction::lifecycle::append_all;
use crate::database::DatabaseManager;
use crate::error::{AppError, AppResult};
use crate::event_store::EventPublisher;
use crate::orders::commands::apply_transition;
use crate::orders::model::Order;
use crate::orders::status::{OrderActor, OrderStatus, TransitionPayload};
use crate::payments::{ConfirmPaymentRequest, IntentResponse, PaymentGateway, PaymentIntent};
use crate::query::handlers as query;
use chrono::Utc;
use tracing::{info, warn};

// endregion: --- Imports

fn ensure_payable(order: &Order, buyer_id: i64) -> AppResult<()> {
    if order.buyer_id != buyer_id {
        return Err(AppError::Forbidden("구매자만 결제할 수 있습니다.".to_string()));
    }
    if order.order_status()? != OrderStatus::PendingPayment {
        return Err(AppError::BadRequest("결제 대기 중인 주문이 아닙니다.".to_string()));
    }
    Ok(())
}

/// 결제 확인 가능 여부
/// 주문에 저장된 intent, metadata 의 order_id, 통화, 금액이 모두 일치해야 한다.
pub fn verify_intent(order: &Order, intent: &PaymentIntent, currency: &str) -> AppResult<()> {
    if order.payment_intent_id.as_deref() != Some(intent.id.as_str()) {
        return Err(AppError::BadRequest(
            "주문의 결제 정보와 일치하지 않습니다.".to_string(),
        ));
    }
    if intent.order_id() != Some(order.id) {
        return Err(AppError::BadRequest("다른 주문의 결제입니다.".to_string()));
    }
    if !intent.currency.eq_ignore_ascii_case(currency) {
        return Err(AppError::BadRequest(format!(
            "결제 통화가 일치하지 않습니다. ({})",
            intent.currency
        )));
    }
    if intent.amount != order.final_price {
        return Err(AppError::BadRequest("결제 금액이 일치하지 않습니다.".to_string()));
    }
    if !intent.succeeded() {
        return Err(AppError::BadRequest(format!(
            "결제가 완료되지 않았습니다. (status: {})",
            intent.status
        )));
    }
    Ok(())
}

/// 1. PaymentIntent 생성
pub async fn handle_create_intent(
    db_manager: &DatabaseManager,
    gateway: &dyn PaymentGateway,
    buyer_id: i64,
    order_id: i64,
) -> AppResult<IntentResponse> {
    let order = query::get_order(db_manager.pool(), order_id).await?;
    ensure_payable(&order, buyer_id)?;

    let intent = gateway.create_intent(order.id, order.final_price).await?;
    sqlx::query("UPDATE orders SET payment_intent_id = $1, updated_at = NOW() WHERE id = $2")
        .bind(&intent.id)
        .bind(order.id)
        .execute(db_manager.pool())
        .await?;

    info!(
        "{:<12} --> 결제 준비 order: {} intent: {}",
        "Payment", order.id, intent.id
    );
    Ok(IntentResponse {
        payment_intent_id: intent.id,
        client_secret: intent.client_secret,
        amount: intent.amount,
        currency: intent.currency,
    })
}

/// 2. 결제 확인
pub async fn handle_confirm_payment(
    db_manager: &DatabaseManager,
    gateway: &dyn PaymentGateway,
    publisher: &dyn EventPublisher,
    currency: &str,
    buyer_id: i64,
    req: ConfirmPaymentRequest,
) -> AppResult<Order> {
    let order = query::get_order(db_manager.pool(), req.order_id).await?;
    ensure_payable(&order, buyer_id)?;

    let intent = gateway.retrieve_intent(&req.payment_intent_id).await?;
    if let Err(e) = verify_intent(&order, &intent, currency) {
        warn!(
            "{:<12} --> 결제 확인 실패 order: {} intent: {}: {}",
            "Payment", order.id, intent.id, e
        );
        return Err(e);
    }

    let mut tx = db_manager.pool().begin().await?;
    let order = query::get_order(&mut *tx, req.order_id).await?;
    let payload = TransitionPayload {
        payment_intent_id: Some(intent.id.clone()),
        ..TransitionPayload::default()
    };
    let (updated, event) = apply_transition(
        &mut tx,
        &order,
        OrderStatus::PendingAddress,
        OrderActor::System,
        &payload,
        Utc::now(),
    )
    .await?;
    let stored = append_all(&mut tx, &[event]).await?;
    tx.commit().await?;

    publisher.publish_all(&stored).await;
    info!("{:<12} --> 결제 완료 order: {}", "Payment", updated.id);
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn order(intent_id: Option<&str>) -> Order {
        let now = Utc::now();
        Order {
            id: 1,
            product_id: 1,
            buyer_id: 5,
            seller_id: 6,
            final_price: 2500,
            status: "pending_payment".into(),
            shipping_address: None,
            tracking_number: None,
            payment_intent_id: intent_id.map(str::to_string),
            cancel_reason: None,
            payment_deadline: now,
            created_at: now,
            updated_at: now,
        }
    }

    fn intent(id: &str, amount: i64, status: &str) -> PaymentIntent {
        PaymentIntent {
            id: id.into(),
            amount,
            currency: "usd".into(),
            status: status.into(),
            client_secret: None,
            metadata: HashMap::from([("order_id".to_string(), "1".to_string())]),
        }
    }

    #[test]
    fn succeeded_intent_for_the_right_amount_is_accepted() {
        let order = order(Some("pi_1"));
        assert!(verify_intent(&order, &intent("pi_1", 2500, "succeeded"), "usd").is_ok());
    }

    #[test]
    fn mismatched_intents_are_refused() {
        let order = order(Some("pi_1"));
        assert!(verify_intent(&order, &intent("pi_2", 2500, "succeeded"), "usd").is_err());
        assert!(verify_intent(&order, &intent("pi_1", 2000, "succeeded"), "usd").is_err());
        assert!(verify_intent(&order, &intent("pi_1", 2500, "processing"), "usd").is_err());
    }

    #[test]
    fn order_without_prepared_intent_cannot_be_confirmed() {
        // 다른 주문에서 이미 성공한 결제를 재사용하는 경우
        let order = order(None);
        let reused = intent("pi_for_order_3", 2500, "succeeded");
        assert!(matches!(
            verify_intent(&order, &reused, "usd"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn intent_created_for_another_order_is_refused() {
        let order = order(Some("pi_1"));
        let mut other = intent("pi_1", 2500, "succeeded");
        other.metadata.insert("order_id".to_string(), "3".to_string());
        assert!(verify_intent(&order, &other, "usd").is_err());

        other.metadata.clear();
        assert!(verify_intent(&order, &other, "usd").is_err());
    }

    #[test]
    fn intent_in_another_currency_is_refused() {
        let order = order(Some("pi_1"));
        let mut krw = intent("pi_1", 2500, "succeeded");
        krw.currency = "krw".into();
        assert!(verify_intent(&order, &krw, "usd").is_err());
        assert!(verify_intent(&order, &intent("pi_1", 2500, "succeeded"), "USD").is_ok());
    }

    #[test]
    fn only_the_buyer_may_pay() {
        let order = order(None);
        assert!(ensure_payable(&order, 5).is_ok());
        assert!(matches!(ensure_payable(&order, 6), Err(AppError::Forbidden(_))));
    }
}
