//! Route definitions for the per-lane session command surface.
//!
//! All endpoints require a provisioned device token.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::session;
use crate::state::AppState;

/// Routes mounted at `/lanes/{lane}/session`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(session::get_session))
        .route("/start", post(session::start))
        .route("/propose", post(session::propose))
        .route("/confirm", post(session::confirm))
        .route("/acknowledge", post(session::acknowledge))
        .route("/waitlist", post(session::choose_waitlist))
        .route("/assign", post(session::assign))
        .route("/customer-response", post(session::customer_response))
        .route("/payment-intent", post(session::create_payment_intent))
        .route("/mark-paid", post(session::mark_paid))
        .route("/sign-agreement", post(session::sign_agreement))
        .route("/reset", post(session::reset))
}
