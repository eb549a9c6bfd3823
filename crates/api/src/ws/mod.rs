//! WebSocket infrastructure for real-time lane synchronization.
//!
//! Provides connection management (lane and event-kind scoped delivery),
//! heartbeat monitoring with missed-pong termination, and the HTTP
//! upgrade handler used by Axum routes.

mod handler;
mod heartbeat;
pub mod manager;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
