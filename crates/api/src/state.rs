use std::sync::Arc;

use frontdesk_core::pricing::PriceQuoter;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: frontdesk_db::DbPool,
    /// Server configuration (device registry, offer window, intervals).
    pub config: Arc<ServerConfig>,
    /// WebSocket connection registry (kiosk and register clients).
    pub ws_manager: Arc<WsManager>,
    /// Event bus every engine mutation publishes to.
    pub event_bus: Arc<frontdesk_events::EventBus>,
    /// Pricing seam (external collaborator; flat rate card by default).
    pub quoter: Arc<dyn PriceQuoter>,
}
