//! HTTP + WebSocket server for the check-in coordination engine.

pub mod background;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod relay;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod ws;
