//! Event-to-WebSocket relay.
//!
//! [`EventRelay`] subscribes to the engine's event bus and fans each
//! event out to the sockets whose lane and subscription filters match.
//! Sockets never observe the bus directly: the relay is the single
//! consumer that serializes each event once.

use std::sync::Arc;

use tokio::sync::broadcast;

use frontdesk_events::CheckinEvent;

use crate::ws::WsManager;

pub struct EventRelay {
    ws_manager: Arc<WsManager>,
}

impl EventRelay {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run the relay loop.
    ///
    /// Exits when the bus closes (the [`EventBus`](frontdesk_events::EventBus)
    /// is dropped during shutdown). Lagging is survivable: events are
    /// replace-the-projection snapshots, so skipped frames are recovered
    /// by the next one.
    pub async fn run(self, mut receiver: broadcast::Receiver<CheckinEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to serialize event");
                            continue;
                        }
                    };
                    self.ws_manager.deliver(&event, &text).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event relay lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, relay shutting down");
                    break;
                }
            }
        }
    }
}
