use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use frontdesk_events::{CheckinEvent, EventKind};

use crate::config::DeviceKind;
use crate::engine::projection;
use crate::middleware::device::DeviceIdentity;
use crate::state::AppState;
use crate::ws::manager::WsManager;

/// Control messages a client may send over an open socket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
enum ClientMessage {
    /// Restrict delivery to these event kinds (empty list = everything).
    Subscribe { kinds: Vec<EventKind> },
    /// Watch a different lane. Register-only; kiosks stay on their lane.
    SetLane { lane: String },
}

/// HTTP handler that upgrades the connection to WebSocket.
///
/// The device token is validated during the upgrade request; the socket
/// starts out scoped to the device's provisioned lane.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    device: DeviceIdentity,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, device))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection with `WsManager`, scoped to the lane.
///   2. Pushes the lane's current session snapshot so the client renders
///      without waiting for the next transition.
///   3. Spawns a sender task that forwards messages from the manager
///      channel, and processes inbound control messages here.
///   4. Cleans up on disconnect.
async fn handle_socket(socket: WebSocket, state: AppState, device: DeviceIdentity) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    let ws_manager: Arc<WsManager> = Arc::clone(&state.ws_manager);
    tracing::info!(conn_id = %conn_id, lane = %device.lane, "WebSocket connected");

    let mut rx = ws_manager.add(conn_id.clone(), Some(device.lane.clone())).await;

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward channel messages to the WebSocket sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
            if closing {
                break;
            }
        }
    });

    send_initial_snapshot(&state, &conn_id, &device.lane).await;

    // Receiver loop: pongs keep the connection alive, Text frames carry
    // control messages.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                ws_manager.mark_pong(&conn_id).await;
            }
            Ok(Message::Text(text)) => {
                handle_client_message(&state, &conn_id, &device, text.as_str()).await;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

/// Push the lane's current view as a SESSION_UPDATED frame to one socket.
async fn send_initial_snapshot(state: &AppState, conn_id: &str, lane: &str) {
    match projection::lane_view(&state.pool, lane).await {
        Ok(view) => {
            let event = CheckinEvent::SessionUpdated {
                lane: lane.to_string(),
                session: view,
            };
            if let Ok(text) = serde_json::to_string(&event) {
                state
                    .ws_manager
                    .send_to(conn_id, Message::Text(text.into()))
                    .await;
            }
        }
        Err(e) => {
            tracing::warn!(conn_id = %conn_id, lane, error = %e, "Failed to build initial snapshot");
        }
    }
}

async fn handle_client_message(
    state: &AppState,
    conn_id: &str,
    device: &DeviceIdentity,
    text: &str,
) {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!(conn_id = %conn_id, error = %e, "Ignoring malformed client message");
            return;
        }
    };

    match message {
        ClientMessage::Subscribe { kinds } => {
            let kinds: HashSet<EventKind> = kinds.into_iter().collect();
            tracing::debug!(conn_id = %conn_id, count = kinds.len(), "Subscription filter updated");
            state.ws_manager.set_subscriptions(conn_id, kinds).await;
        }
        ClientMessage::SetLane { lane } => {
            if device.kind != DeviceKind::Register {
                tracing::debug!(conn_id = %conn_id, "Ignoring SET_LANE from a kiosk");
                return;
            }
            tracing::debug!(conn_id = %conn_id, lane = %lane, "Connection re-scoped to lane");
            state.ws_manager.set_lane(conn_id, lane.clone()).await;
            send_initial_snapshot(state, conn_id, &lane).await;
        }
    }
}
