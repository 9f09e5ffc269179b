use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// 도메인 이벤트
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum MarketEvent {
    // 입찰 이벤트
    BidPlaced {
        product_id: i64,
        bidder_id: i64,
        amount: i64,
        is_auto: bool,
        current_price: i64,
        highest_bidder_id: i64,
        outbid_id: Option<i64>,
        timestamp: DateTime<Utc>,
    },
    // 자동 연장 이벤트
    AuctionExtended {
        product_id: i64,
        new_end_time: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },
    // 입찰 거부 이벤트
    BidderRejected {
        product_id: i64,
        bidder_id: i64,
        current_price: i64,
        highest_bidder_id: Option<i64>,
        timestamp: DateTime<Utc>,
    },
    // 즉시 구매 이벤트
    BuyNowExecuted {
        product_id: i64,
        buyer_id: i64,
        price: i64,
        timestamp: DateTime<Utc>,
    },
    // 경매 종료 이벤트
    AuctionClosed {
        product_id: i64,
        winner_id: Option<i64>,
        final_price: Option<i64>,
        timestamp: DateTime<Utc>,
    },
    // 주문 생성 이벤트
    OrderCreated {
        order_id: i64,
        product_id: i64,
        buyer_id: i64,
        seller_id: i64,
        final_price: i64,
        timestamp: DateTime<Utc>,
    },
    // 주문 상태 변경 이벤트
    OrderStatusChanged {
        order_id: i64,
        buyer_id: i64,
        seller_id: i64,
        from: String,
        to: String,
        timestamp: DateTime<Utc>,
    },
    // 채팅 메시지 이벤트
    ChatMessageSent {
        message_id: i64,
        order_id: i64,
        sender_id: i64,
        content: String,
        timestamp: DateTime<Utc>,
    },
}

/// 실시간 알림 (방, 이벤트 이름, 데이터)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub room: String,
    pub event: &'static str,
    pub data: serde_json::Value,
}

pub fn product_room(product_id: i64) -> String {
    format!("product:{}", product_id)
}

pub fn order_room(order_id: i64) -> String {
    format!("order:{}", order_id)
}

pub fn user_room(user_id: i64) -> String {
    format!("user:{}", user_id)
}

impl MarketEvent {
    /// 이벤트 저장소의 event_type 컬럼 값
    pub fn event_type(&self) -> &'static str {
        match self {
            MarketEvent::BidPlaced { .. } => "BidPlaced",
            MarketEvent::AuctionExtended { .. } => "AuctionExtended",
            MarketEvent::BidderRejected { .. } => "BidderRejected",
            MarketEvent::BuyNowExecuted { .. } => "BuyNowExecuted",
            MarketEvent::AuctionClosed { .. } => "AuctionClosed",
            MarketEvent::OrderCreated { .. } => "OrderCreated",
            MarketEvent::OrderStatusChanged { .. } => "OrderStatusChanged",
            MarketEvent::ChatMessageSent { .. } => "ChatMessageSent",
        }
    }

    /// (aggregate_type, aggregate_id)
    pub fn aggregate(&self) -> (&'static str, i64) {
        match self {
            MarketEvent::BidPlaced { product_id, .. }
            | MarketEvent::AuctionExtended { product_id, .. }
            | MarketEvent::BidderRejected { product_id, .. }
            | MarketEvent::BuyNowExecuted { product_id, .. }
            | MarketEvent::AuctionClosed { product_id, .. } => ("product", *product_id),
            MarketEvent::OrderCreated { order_id, .. }
            | MarketEvent::OrderStatusChanged { order_id, .. }
            | MarketEvent::ChatMessageSent { order_id, .. } => ("order", *order_id),
        }
    }

    /// 이벤트를 받을 방과 소켓 이벤트 이름
    pub fn notifications(&self) -> Vec<Notification> {
        let data = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_object().and_then(|o| o.values().next().cloned()))
            .unwrap_or_else(|| json!({}));

        match self {
            MarketEvent::BidPlaced {
                product_id,
                outbid_id,
                ..
            } => {
                let mut out = vec![Notification {
                    room: product_room(*product_id),
                    event: "bid-placed",
                    data: data.clone(),
                }];
                if let Some(outbid) = outbid_id {
                    out.push(Notification {
                        room: user_room(*outbid),
                        event: "outbid",
                        data,
                    });
                }
                out
            }
            MarketEvent::AuctionExtended { product_id, .. } => vec![Notification {
                room: product_room(*product_id),
                event: "auction-extended",
                data,
            }],
            MarketEvent::BidderRejected {
                product_id,
                bidder_id,
                ..
            } => vec![
                Notification {
                    room: product_room(*product_id),
                    event: "bid-placed",
                    data: data.clone(),
                },
                Notification {
                    room: user_room(*bidder_id),
                    event: "bid-rejected",
                    data,
                },
            ],
            MarketEvent::BuyNowExecuted { product_id, .. } => vec![Notification {
                room: product_room(*product_id),
                event: "auction-closed",
                data,
            }],
            MarketEvent::AuctionClosed { product_id, .. } => vec![Notification {
                room: product_room(*product_id),
                event: "auction-closed",
                data,
            }],
            MarketEvent::OrderCreated {
                buyer_id,
                seller_id,
                ..
            } => vec![
                Notification {
                    room: user_room(*buyer_id),
                    event: "order-list-updated",
                    data: data.clone(),
                },
                Notification {
                    room: user_room(*seller_id),
                    event: "order-list-updated",
                    data,
                },
            ],
            MarketEvent::OrderStatusChanged {
                order_id,
                buyer_id,
                seller_id,
                ..
            } => vec![
                Notification {
                    room: order_room(*order_id),
                    event: "order-updated",
                    data: data.clone(),
                },
                Notification {
                    room: user_room(*buyer_id),
                    event: "order-list-updated",
                    data: data.clone(),
                },
                Notification {
                    room: user_room(*seller_id),
                    event: "order-list-updated",
                    data,
                },
            ],
            MarketEvent::ChatMessageSent { order_id, .. } => vec![Notification {
                room: order_room(*order_id),
                event: "new-message",
                data,
            }],
        }
    }
}
