//! Domain types for the check-in coordination engine.
//!
//! This crate has zero internal deps (no sqlx, no axum) so the pure
//! state-machine rules can be used by the API layer, the background
//! sweeps, and any future CLI tooling without dragging in I/O.

pub mod error;
pub mod payment;
pub mod pricing;
pub mod resource;
pub mod session;
pub mod tier;
pub mod types;
pub mod waitlist;

pub use error::CoreError;
pub use tier::RentalType;
