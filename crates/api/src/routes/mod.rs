pub mod availability;
pub mod health;
pub mod lanes;
pub mod waitlist;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                       WebSocket (device-scoped)
///
/// /lanes/{lane}/session                     current lane view (GET)
/// /lanes/{lane}/session/start               identity capture (POST)
/// /lanes/{lane}/session/propose             propose a tier (POST)
/// /lanes/{lane}/session/confirm             lock the selection (POST)
/// /lanes/{lane}/session/acknowledge         acknowledge the lock (POST)
/// /lanes/{lane}/session/waitlist            record fallback choice (POST)
/// /lanes/{lane}/session/assign              tentative assignment (POST)
/// /lanes/{lane}/session/customer-response   cross-type answer (POST)
/// /lanes/{lane}/session/payment-intent      quote + intent (POST)
/// /lanes/{lane}/session/mark-paid           record payment (POST)
/// /lanes/{lane}/session/sign-agreement      sign + finalize (POST)
/// /lanes/{lane}/session/reset               abandon the session (POST)
///
/// /availability                             per-tier snapshot (GET)
///
/// /waitlist                                 open entries (GET, staff)
/// /waitlist/{id}/cancel                     cancel an entry (POST, staff)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/lanes/{lane}/session", lanes::router())
        .merge(availability::router())
        .nest("/waitlist", waitlist::router())
}
