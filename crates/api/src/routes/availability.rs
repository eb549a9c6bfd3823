//! Route definition for the availability snapshot.

use axum::routing::get;
use axum::Router;

use crate::handlers::availability;
use crate::state::AppState;

/// Routes mounted at the API root.
pub fn router() -> Router<AppState> {
    Router::new().route("/availability", get(availability::get_availability))
}
