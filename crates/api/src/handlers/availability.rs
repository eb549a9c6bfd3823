//! Handler for the availability snapshot endpoint.

use axum::extract::State;
use axum::Json;

use frontdesk_events::TierAvailability;

use crate::engine::allocator;
use crate::error::AppResult;
use crate::middleware::device::DeviceIdentity;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/availability
///
/// Per-tier raw and effective availability. The effective number is what
/// the assignment flow will actually allow.
pub async fn get_availability(
    _device: DeviceIdentity,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<TierAvailability>>>> {
    let availability = allocator::availability_snapshot(&state.pool).await?;
    Ok(Json(DataResponse { data: availability }))
}
