use std::collections::{HashMap, HashSet};

use axum::body::Bytes;
use axum::extract::ws::Message;
use tokio::sync::{mpsc, RwLock};

use frontdesk_core::types::Timestamp;
use frontdesk_events::{CheckinEvent, EventKind};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// Lane this connection watches. Lane-scoped events are only
    /// delivered here when it matches.
    pub lane: Option<String>,
    /// Event-kind filter; `None` means every kind.
    pub kinds: Option<HashSet<EventKind>>,
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    /// When this connection was established.
    pub connected_at: Timestamp,
    /// Set when a Ping goes out, cleared by the Pong. Still set at the
    /// next heartbeat tick means the peer is gone.
    awaiting_pong: bool,
}

/// Manages all active WebSocket connections.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    /// Create a new, empty connection manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection bound to a lane.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(
        &self,
        conn_id: String,
        lane: Option<String>,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            lane,
            kinds: None,
            sender: tx,
            connected_at: chrono::Utc::now(),
            awaiting_pong: false,
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a connection by its ID.
    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// Re-point a connection at a different lane (staff dashboards switch
    /// lanes without reconnecting).
    pub async fn set_lane(&self, conn_id: &str, lane: String) {
        if let Some(conn) = self.connections.write().await.get_mut(conn_id) {
            conn.lane = Some(lane);
        }
    }

    /// Replace a connection's event-kind filter. An empty set means
    /// "everything" (same as never subscribing).
    pub async fn set_subscriptions(&self, conn_id: &str, kinds: HashSet<EventKind>) {
        if let Some(conn) = self.connections.write().await.get_mut(conn_id) {
            conn.kinds = if kinds.is_empty() { None } else { Some(kinds) };
        }
    }

    /// Record a Pong from the peer.
    pub async fn mark_pong(&self, conn_id: &str) {
        if let Some(conn) = self.connections.write().await.get_mut(conn_id) {
            conn.awaiting_pong = false;
        }
    }

    /// Deliver one event to every connection whose lane and kind filters
    /// match. `text` is the pre-serialized frame so the payload is encoded
    /// once, not per socket.
    pub async fn deliver(&self, event: &CheckinEvent, text: &str) {
        let kind = event.kind();
        let conns = self.connections.read().await;
        for conn in conns.values() {
            if let Some(lane) = event.lane() {
                if conn.lane.as_deref() != Some(lane) {
                    continue;
                }
            }
            if let Some(kinds) = &conn.kinds {
                if !kinds.contains(&kind) {
                    continue;
                }
            }
            let _ = conn.sender.send(Message::Text(text.to_string().into()));
        }
    }

    /// Send a message to one connection. Returns `false` if it is gone.
    pub async fn send_to(&self, conn_id: &str, message: Message) -> bool {
        match self.connections.read().await.get(conn_id) {
            Some(conn) => conn.sender.send(message).is_ok(),
            None => false,
        }
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    ///
    /// Used during graceful shutdown to notify all clients before the
    /// server stops accepting new connections.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Heartbeat tick: ping every live connection and reap the ones that
    /// never answered the previous ping.
    pub async fn ping_and_reap(&self) {
        let mut conns = self.connections.write().await;
        let stale: Vec<String> = conns
            .iter()
            .filter(|(_, conn)| conn.awaiting_pong)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &stale {
            if let Some(conn) = conns.remove(id) {
                let _ = conn.sender.send(Message::Close(None));
                tracing::info!(conn_id = %id, "Reaped unresponsive WebSocket connection");
            }
        }
        for conn in conns.values_mut() {
            conn.awaiting_pong = true;
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
