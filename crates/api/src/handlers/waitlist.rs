//! Handlers for the staff waitlist surface.

use axum::extract::{Path, State};
use axum::Json;

use frontdesk_core::error::CoreError;
use frontdesk_core::types::DbId;
use frontdesk_core::waitlist::{ReleaseReason, WaitlistStatus};
use frontdesk_db::models::waitlist::WaitlistEntry;
use frontdesk_db::repositories::{ReservationRepo, WaitlistRepo};
use frontdesk_events::CheckinEvent;

use crate::config::DeviceKind;
use crate::error::{AppError, AppResult};
use crate::middleware::device::DeviceIdentity;
use crate::response::DataResponse;
use crate::state::AppState;

fn require_register(device: &DeviceIdentity) -> AppResult<()> {
    if device.kind != DeviceKind::Register {
        return Err(AppError::Core(CoreError::DeviceDisabled));
    }
    Ok(())
}

/// GET /api/v1/waitlist
///
/// Open entries, oldest first. Register-only.
pub async fn list_open(
    device: DeviceIdentity,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<WaitlistEntry>>>> {
    require_register(&device)?;
    let entries = WaitlistRepo::list_open(&state.pool).await?;
    Ok(Json(DataResponse { data: entries }))
}

/// POST /api/v1/waitlist/{id}/cancel
///
/// Staff cancellation of an open entry. Releases any live hold so the
/// unit goes straight back into availability.
pub async fn cancel(
    device: DeviceIdentity,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<WaitlistEntry>>> {
    require_register(&device)?;

    let mut tx = state.pool.begin().await?;
    let entry = WaitlistRepo::lock_by_id(&mut *tx, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "waitlist entry",
            id,
        }))?;
    if !WaitlistRepo::cancel(&mut *tx, id).await? {
        return Err(AppError::Core(CoreError::InvalidState(format!(
            "waitlist entry {id} is already closed"
        ))));
    }
    ReservationRepo::release_for_waitlist(&mut *tx, id, ReleaseReason::Cancelled).await?;
    tx.commit().await?;

    tracing::info!(waitlist_id = id, "Waitlist entry cancelled by staff");
    state.event_bus.publish(CheckinEvent::WaitlistUpdated {
        waitlist_id: id,
        desired_tier: entry.desired_tier,
        status: WaitlistStatus::Cancelled,
    });

    let entry = WaitlistRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "waitlist entry",
            id,
        }))?;
    Ok(Json(DataResponse { data: entry }))
}
