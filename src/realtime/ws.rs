/// 웹소켓 연결
/// 클라이언트: {"event": "join-room", "room": "order:12"} / {"event": "leave-room", ...}
/// 서버: {"event", "room", "data"}
/// 연결 시 자신의 user:{id} 방에 자동으로 들어간다.
// region:    --- Imports
use crate::auth::AuthUser;
use crate::chat::commands::authorized_order;
use crate::error::{AppError, AppResult};
use crate::realtime::hub::{RealtimeHub, ServerFrame};
use crate::state::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

// endregion: --- Imports

const OUTBOX_CAPACITY: usize = 64;

/// 방 이름
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomKey {
    Product(i64),
    Order(i64),
    User(i64),
}

impl FromStr for RoomKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::BadRequest(format!("알 수 없는 방입니다: {}", s));
        let (kind, id) = s.split_once(':').ok_or_else(invalid)?;
        let id: i64 = id.parse().map_err(|_| invalid())?;
        match kind {
            "product" => Ok(RoomKey::Product(id)),
            "order" => Ok(RoomKey::Order(id)),
            "user" => Ok(RoomKey::User(id)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomKey::Product(id) => write!(f, "product:{}", id),
            RoomKey::Order(id) => write!(f, "order:{}", id),
            RoomKey::User(id) => write!(f, "user:{}", id),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ClientFrame {
    JoinRoom { room: String },
    LeaveRoom { room: String },
}

/// 방 접근 권한
/// user:{id} 는 본인, order:{id} 는 구매자/판매자만, product:{id} 는 누구나.
/// 주문 방에는 채팅이 흐르므로 관리자도 들어올 수 없다.
async fn authorize(state: &AppState, user: AuthUser, room: RoomKey) -> AppResult<()> {
    match room {
        RoomKey::Product(_) => Ok(()),
        RoomKey::User(id) if id == user.id => Ok(()),
        RoomKey::User(_) => Err(AppError::Forbidden("다른 사용자의 방입니다.".to_string())),
        RoomKey::Order(id) => authorized_order(&state.db, user, id, false)
            .await
            .map(|_| ()),
    }
}

/// GET /ws?token=...
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    user: AuthUser,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, user, state))
}

struct Connection {
    user: AuthUser,
    hub: Arc<RealtimeHub>,
    outbox: mpsc::Sender<ServerFrame>,
    rooms: HashMap<RoomKey, JoinHandle<()>>,
}

impl Connection {
    fn join(&mut self, room: RoomKey) {
        if self.rooms.contains_key(&room) {
            return;
        }
        let mut subscription = self.hub.subscribe(&room.to_string());
        let outbox = self.outbox.clone();
        let handle = tokio::spawn(async move {
            loop {
                match subscription.recv().await {
                    Ok(frame) => {
                        if outbox.send(frame).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("{:<12} --> 느린 구독자, {}개 알림 건너뜀", "Realtime", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        debug!("{:<12} --> user: {} join {}", "Realtime", self.user.id, room);
        self.rooms.insert(room, handle);
    }

    fn leave(&mut self, room: RoomKey) {
        if let Some(handle) = self.rooms.remove(&room) {
            handle.abort();
            debug!("{:<12} --> user: {} leave {}", "Realtime", self.user.id, room);
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        for (_, handle) in self.rooms.drain() {
            handle.abort();
        }
    }
}

fn error_frame(room: &str, err: &AppError) -> ServerFrame {
    let (_, code) = err.status_and_code();
    ServerFrame {
        event: "error".to_string(),
        room: room.to_string(),
        data: json!({ "code": code, "message": err.to_string() }),
    }
}

async fn handle_client_frame(
    state: &AppState,
    conn: &mut Connection,
    text: &str,
) -> Option<ServerFrame> {
    let frame: ClientFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => return Some(error_frame("", &AppError::BadRequest(e.to_string()))),
    };
    match frame {
        ClientFrame::JoinRoom { room } => {
            let key = match room.parse::<RoomKey>() {
                Ok(key) => key,
                Err(e) => return Some(error_frame(&room, &e)),
            };
            match authorize(state, conn.user, key).await {
                Ok(()) => {
                    conn.join(key);
                    None
                }
                Err(e) => Some(error_frame(&room, &e)),
            }
        }
        ClientFrame::LeaveRoom { room } => {
            if let Ok(key) = room.parse::<RoomKey>() {
                conn.leave(key);
            }
            None
        }
    }
}

async fn handle_socket(mut socket: WebSocket, user: AuthUser, state: AppState) {
    info!("{:<12} --> 웹소켓 연결 user: {}", "Realtime", user.id);
    let (outbox, mut inbox) = mpsc::channel::<ServerFrame>(OUTBOX_CAPACITY);
    let mut conn = Connection {
        user,
        hub: Arc::clone(&state.hub),
        outbox,
        rooms: HashMap::new(),
    };
    conn.join(RoomKey::User(user.id));

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                let reply = match incoming {
                    Some(Ok(Message::Text(text))) => handle_client_frame(&state, &mut conn, &text).await,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => None,
                    Some(Err(e)) => {
                        debug!("{:<12} --> 웹소켓 수신 오류: {}", "Realtime", e);
                        break;
                    }
                };
                if let Some(frame) = reply {
                    if send_frame(&mut socket, &frame).await.is_err() {
                        break;
                    }
                }
            }
            Some(frame) = inbox.recv() => {
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    drop(conn);
    state.hub.prune();
    info!("{:<12} --> 웹소켓 종료 user: {}", "Realtime", user.id);
}

async fn send_frame(socket: &mut WebSocket, frame: &ServerFrame) -> Result<(), axum::Error> {
    let text = serde_json::to_string(frame).map_err(axum::Error::new)?;
    socket.send(Message::Text(text)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_keys_parse_and_print() {
        assert_eq!("order:12".parse::<RoomKey>().unwrap(), RoomKey::Order(12));
        assert_eq!(RoomKey::Product(3).to_string(), "product:3");
        assert!("order:abc".parse::<RoomKey>().is_err());
        assert!("lobby:1".parse::<RoomKey>().is_err());
        assert!("user".parse::<RoomKey>().is_err());
    }

    #[test]
    fn client_frames_use_socket_event_names() {
        let frame: ClientFrame =
            serde_json::from_str(r#"{"event":"join-room","room":"product:1"}"#).unwrap();
        assert_eq!(
            frame,
            ClientFrame::JoinRoom {
                room: "product:1".into()
            }
        );
        assert!(serde_json::from_str::<ClientFrame>(r#"{"event":"dance"}"#).is_err());
    }

    #[tokio::test]
    async fn joined_rooms_forward_hub_frames() {
        let hub = Arc::new(RealtimeHub::new());
        let (outbox, mut inbox) = mpsc::channel(8);
        let mut conn = Connection {
            user: AuthUser {
                id: 1,
                role: crate::users::model::UserRole::Bidder,
            },
            hub: Arc::clone(&hub),
            outbox,
            rooms: HashMap::new(),
        };
        conn.join(RoomKey::Product(5));

        let delivered = hub.broadcast(&crate::auction::events::Notification {
            room: "product:5".into(),
            event: "bid-placed",
            data: json!({"current_price": 1200}),
        });
        assert_eq!(delivered, 1);

        let frame = inbox.recv().await.unwrap();
        assert_eq!(frame.event, "bid-placed");
        assert_eq!(frame.room, "product:5");

        conn.leave(RoomKey::Product(5));
        assert!(conn.rooms.is_empty());
    }
}
