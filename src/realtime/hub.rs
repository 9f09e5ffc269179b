/// 방(room) 단위 실시간 알림 허브
/// 방마다 broadcast 채널 하나. 첫 구독 시 생성되고 구독자가 없으면 제거된다.
// region:    --- Imports
use crate::auction::events::{MarketEvent, Notification};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

// endregion: --- Imports

const ROOM_CAPACITY: usize = 256;

/// 클라이언트로 보내는 프레임
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerFrame {
    pub event: String,
    pub room: String,
    pub data: serde_json::Value,
}

impl From<&Notification> for ServerFrame {
    fn from(n: &Notification) -> Self {
        Self {
            event: n.event.to_string(),
            room: n.room.clone(),
            data: n.data.clone(),
        }
    }
}

#[derive(Default)]
pub struct RealtimeHub {
    rooms: Mutex<HashMap<String, broadcast::Sender<ServerFrame>>>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// 방 구독
    pub fn subscribe(&self, room: &str) -> broadcast::Receiver<ServerFrame> {
        let mut rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
        rooms
            .entry(room.to_string())
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe()
    }

    /// 방에 알림 전송, 받은 구독자 수 반환
    pub fn broadcast(&self, notification: &Notification) -> usize {
        let mut rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
        let Some(sender) = rooms.get(&notification.room) else {
            return 0;
        };
        match sender.send(ServerFrame::from(notification)) {
            Ok(count) => count,
            Err(_) => {
                // 구독자 없음
                rooms.remove(&notification.room);
                0
            }
        }
    }

    /// 이벤트의 모든 알림 전송
    pub fn dispatch(&self, event: &MarketEvent) {
        for notification in event.notifications() {
            let delivered = self.broadcast(&notification);
            debug!(
                "{:<12} --> {} -> {} ({}명)",
                "Realtime", notification.event, notification.room, delivered
            );
        }
    }

    /// 구독자가 없는 방 정리
    pub fn prune(&self) {
        let mut rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
        rooms.retain(|_, sender| sender.receiver_count() > 0);
    }

    pub fn room_count(&self) -> usize {
        self.rooms.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn chat_event(order_id: i64) -> MarketEvent {
        MarketEvent::ChatMessageSent {
            message_id: 1,
            order_id,
            sender_id: 1,
            content: "hi".into(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn subscribers_receive_room_events_only() {
        let hub = RealtimeHub::new();
        let mut order_rx = hub.subscribe("order:1");
        let mut other_rx = hub.subscribe("order:2");

        hub.dispatch(&chat_event(1));

        let frame = order_rx.recv().await.unwrap();
        assert_eq!(frame.event, "new-message");
        assert_eq!(frame.room, "order:1");
        assert!(other_rx.try_recv().is_err());
    }

    #[test]
    fn broadcasting_to_an_unknown_room_is_a_no_op() {
        let hub = RealtimeHub::new();
        hub.dispatch(&chat_event(5));
        assert_eq!(hub.room_count(), 0);
    }

    #[test]
    fn empty_rooms_are_dropped() {
        let hub = RealtimeHub::new();
        let rx = hub.subscribe("order:3");
        assert_eq!(hub.room_count(), 1);
        drop(rx);
        hub.prune();
        assert_eq!(hub.room_count(), 0);

        let rx = hub.subscribe("order:3");
        drop(rx);
        hub.dispatch(&chat_event(3));
        assert_eq!(hub.room_count(), 0);
    }
}
