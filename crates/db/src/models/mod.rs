//! Row models and DTOs.
//!
//! Each submodule contains a `FromRow + Serialize` entity struct matching
//! the database row, plus any request DTOs. Non-nullable enum columns
//! decode straight into the core enums via `#[sqlx(try_from = "String")]`;
//! nullable enum columns stay `Option<String>` in the row with typed
//! accessors (the CHECK constraints guarantee the stored values parse).

pub mod checkin_block;
pub mod customer;
pub mod lane_session;
pub mod reservation;
pub mod resource;
pub mod visit;
pub mod waitlist;
