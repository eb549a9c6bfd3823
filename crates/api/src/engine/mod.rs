//! The check-in coordination engine.
//!
//! Split by lifecycle phase: [`session`] owns session creation, payment
//! and completion commands; [`selection`] owns the two-sided tier
//! negotiation; [`allocator`] owns inventory math and the finalize
//! transaction; [`projection`] builds the client-facing snapshots.
//!
//! Every mutation re-validates the command against the state machine in
//! `frontdesk_core::session` before touching the database, and publishes
//! the resulting events on the bus only after its transaction commits.

pub mod allocator;
pub mod projection;
pub mod selection;
pub mod session;

use frontdesk_core::error::CoreError;
use frontdesk_db::models::lane_session::LaneSession;
use frontdesk_db::repositories::LaneSessionRepo;
use frontdesk_events::CheckinEvent;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// The lane's live session, or INVALID_STATE when the lane is idle.
pub(crate) async fn require_live(state: &AppState, lane: &str) -> AppResult<LaneSession> {
    LaneSessionRepo::find_live_by_lane(&state.pool, lane)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::InvalidState(format!(
                "lane {lane} has no active session"
            )))
        })
}

/// Project a session and push the snapshot as SESSION_UPDATED.
pub(crate) async fn publish_session(
    state: &AppState,
    session: &LaneSession,
) -> AppResult<frontdesk_events::SessionView> {
    let view = projection::session_view(&state.pool, session).await?;
    state.event_bus.publish(CheckinEvent::SessionUpdated {
        lane: session.lane_id.clone(),
        session: view.clone(),
    });
    Ok(view)
}
