//! Route definitions for the staff waitlist surface.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::waitlist;
use crate::state::AppState;

/// Routes mounted at `/waitlist`. Register devices only.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(waitlist::list_open))
        .route("/{id}/cancel", post(waitlist::cancel))
}
