//! Domain events and the in-process event bus.
//!
//! - [`CheckinEvent`] — closed tagged union of every event the engine can
//!   emit. Both producers (engine, sweeps) and consumers (WebSocket relay)
//!   match exhaustively, so adding a variant is a compile-visible change.
//! - [`EventKind`] — fieldless mirror of the union, used for per-socket
//!   subscription filters.
//! - [`EventBus`] — publish/subscribe hub backed by
//!   `tokio::sync::broadcast`, shared via `Arc<EventBus>`.

pub mod bus;
pub mod event;

pub use bus::EventBus;
pub use event::{CheckinEvent, EventKind, SessionView, TierAvailability};
