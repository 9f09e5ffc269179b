/// 주문 상태 머신
/// pending_payment → pending_address → pending_shipping → pending_delivery → completed
/// 종료 전이면 어느 단계에서든 cancelled
// region:    --- Imports
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// endregion: --- Imports

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    PendingPayment,
    PendingAddress,
    PendingShipping,
    PendingDelivery,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::PendingPayment,
        OrderStatus::PendingAddress,
        OrderStatus::PendingShipping,
        OrderStatus::PendingDelivery,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::PendingAddress => "pending_address",
            OrderStatus::PendingShipping => "pending_shipping",
            OrderStatus::PendingDelivery => "pending_delivery",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl FromStr for OrderStatus {
    type Err = TransitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| TransitionError::UnknownStatus(s.to_string()))
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 상태 변경 주체
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderActor {
    Buyer,
    Seller,
    /// 결제 확인, 스케줄러
    System,
}

/// 상태 변경 시 함께 전달되는 값
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionPayload {
    pub shipping_address: Option<String>,
    pub tracking_number: Option<String>,
    pub cancel_reason: Option<String>,
    pub payment_intent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("알 수 없는 주문 상태입니다: {0}")]
    UnknownStatus(String),
    #[error("{from} 에서 {to} 로 변경할 수 없습니다.")]
    NotAllowed { from: OrderStatus, to: OrderStatus },
    #[error("이 상태 변경 권한이 없습니다.")]
    WrongActor,
    #[error("필수 항목이 누락되었습니다: {0}")]
    MissingField(&'static str),
}

impl TransitionError {
    pub fn code(&self) -> &'static str {
        match self {
            TransitionError::UnknownStatus(_) => "UNKNOWN_STATUS",
            TransitionError::NotAllowed { .. } => "INVALID_TRANSITION",
            TransitionError::WrongActor => "WRONG_ACTOR",
            TransitionError::MissingField(_) => "MISSING_FIELD",
        }
    }
}

/// 상태 전이 검증
pub fn validate_transition(
    from: OrderStatus,
    to: OrderStatus,
    actor: OrderActor,
    payload: &TransitionPayload,
) -> Result<(), TransitionError> {
    use OrderActor::*;
    use OrderStatus::*;

    let allowed_actors: &[OrderActor] = match (from, to) {
        (PendingPayment, PendingAddress) => &[System],
        (PendingAddress, PendingShipping) => &[Buyer],
        (PendingShipping, PendingDelivery) => &[Seller],
        (PendingDelivery, Completed) => &[Buyer],
        (PendingPayment, Cancelled) => &[Buyer, Seller, System],
        (PendingAddress | PendingShipping | PendingDelivery, Cancelled) => &[Seller],
        _ => return Err(TransitionError::NotAllowed { from, to }),
    };
    if !allowed_actors.contains(&actor) {
        return Err(TransitionError::WrongActor);
    }

    let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
    match to {
        PendingAddress if !present(&payload.payment_intent_id) => {
            Err(TransitionError::MissingField("payment_intent_id"))
        }
        PendingShipping if !present(&payload.shipping_address) => {
            Err(TransitionError::MissingField("shipping_address"))
        }
        PendingDelivery if !present(&payload.tracking_number) => {
            Err(TransitionError::MissingField("tracking_number"))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> TransitionPayload {
        TransitionPayload::default()
    }

    #[test]
    fn happy_path_follows_the_pipeline() {
        let steps = [
            (
                OrderStatus::PendingPayment,
                OrderStatus::PendingAddress,
                OrderActor::System,
                TransitionPayload {
                    payment_intent_id: Some("pi_123".into()),
                    ..payload()
                },
            ),
            (
                OrderStatus::PendingAddress,
                OrderStatus::PendingShipping,
                OrderActor::Buyer,
                TransitionPayload {
                    shipping_address: Some("1 Main St".into()),
                    ..payload()
                },
            ),
            (
                OrderStatus::PendingShipping,
                OrderStatus::PendingDelivery,
                OrderActor::Seller,
                TransitionPayload {
                    tracking_number: Some("TRK-1".into()),
                    ..payload()
                },
            ),
            (
                OrderStatus::PendingDelivery,
                OrderStatus::Completed,
                OrderActor::Buyer,
                payload(),
            ),
        ];
        for (from, to, actor, p) in steps {
            assert_eq!(validate_transition(from, to, actor, &p), Ok(()), "{from} -> {to}");
        }
    }

    #[test]
    fn skipping_steps_is_not_allowed() {
        assert_eq!(
            validate_transition(
                OrderStatus::PendingPayment,
                OrderStatus::Completed,
                OrderActor::Buyer,
                &payload()
            ),
            Err(TransitionError::NotAllowed {
                from: OrderStatus::PendingPayment,
                to: OrderStatus::Completed
            })
        );
        assert!(validate_transition(
            OrderStatus::Completed,
            OrderStatus::Cancelled,
            OrderActor::Seller,
            &payload()
        )
        .is_err());
    }

    #[test]
    fn only_the_right_party_may_advance() {
        assert_eq!(
            validate_transition(
                OrderStatus::PendingShipping,
                OrderStatus::PendingDelivery,
                OrderActor::Buyer,
                &TransitionPayload {
                    tracking_number: Some("TRK".into()),
                    ..payload()
                }
            ),
            Err(TransitionError::WrongActor)
        );
        // 결제 완료는 결제 확인을 통해서만
        assert_eq!(
            validate_transition(
                OrderStatus::PendingPayment,
                OrderStatus::PendingAddress,
                OrderActor::Buyer,
                &TransitionPayload {
                    payment_intent_id: Some("pi".into()),
                    ..payload()
                }
            ),
            Err(TransitionError::WrongActor)
        );
    }

    #[test]
    fn cancellation_rules() {
        assert!(validate_transition(
            OrderStatus::PendingPayment,
            OrderStatus::Cancelled,
            OrderActor::Buyer,
            &payload()
        )
        .is_ok());
        assert_eq!(
            validate_transition(
                OrderStatus::PendingShipping,
                OrderStatus::Cancelled,
                OrderActor::Buyer,
                &payload()
            ),
            Err(TransitionError::WrongActor)
        );
        assert!(validate_transition(
            OrderStatus::PendingDelivery,
            OrderStatus::Cancelled,
            OrderActor::Seller,
            &payload()
        )
        .is_ok());
    }

    #[test]
    fn required_fields_must_be_non_blank() {
        assert_eq!(
            validate_transition(
                OrderStatus::PendingAddress,
                OrderStatus::PendingShipping,
                OrderActor::Buyer,
                &TransitionPayload {
                    shipping_address: Some("   ".into()),
                    ..payload()
                }
            ),
            Err(TransitionError::MissingField("shipping_address"))
        );
    }

    #[test]
    fn status_strings_round_through_the_database_form() {
        assert_eq!(
            "pending_delivery".parse::<OrderStatus>().unwrap(),
            OrderStatus::PendingDelivery
        );
        assert!("shipped".parse::<OrderStatus>().is_err());
    }
}
