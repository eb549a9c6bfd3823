//! Handlers for the `/lanes/{lane}/session` command surface.

use axum::extract::{Path, State};
use axum::Json;

use frontdesk_db::models::lane_session::{
    AcknowledgeSelection, AssignRequest, ChooseWaitlist, ConfirmSelection, CustomerResponse,
    ProposeSelection, SignAgreement, StartSession,
};
use frontdesk_events::SessionView;

use crate::engine::{projection, selection, session};
use crate::error::AppResult;
use crate::handlers::ensure_lane_access;
use crate::middleware::device::DeviceIdentity;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/lanes/{lane}/session
///
/// The lane's current projected view (IDLE placeholder when no session).
pub async fn get_session(
    device: DeviceIdentity,
    State(state): State<AppState>,
    Path(lane): Path<String>,
) -> AppResult<Json<DataResponse<SessionView>>> {
    ensure_lane_access(&device, &lane)?;
    let view = projection::lane_view(&state.pool, &lane).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/lanes/{lane}/session/start
pub async fn start(
    device: DeviceIdentity,
    State(state): State<AppState>,
    Path(lane): Path<String>,
    Json(body): Json<StartSession>,
) -> AppResult<Json<DataResponse<SessionView>>> {
    ensure_lane_access(&device, &lane)?;
    let view = session::start(&state, &lane, body).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/lanes/{lane}/session/propose
pub async fn propose(
    device: DeviceIdentity,
    State(state): State<AppState>,
    Path(lane): Path<String>,
    Json(body): Json<ProposeSelection>,
) -> AppResult<Json<DataResponse<SessionView>>> {
    ensure_lane_access(&device, &lane)?;
    let view = selection::propose(&state, &lane, body).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/lanes/{lane}/session/confirm
pub async fn confirm(
    device: DeviceIdentity,
    State(state): State<AppState>,
    Path(lane): Path<String>,
    Json(body): Json<ConfirmSelection>,
) -> AppResult<Json<DataResponse<SessionView>>> {
    ensure_lane_access(&device, &lane)?;
    let view = selection::confirm(&state, &lane, body).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/lanes/{lane}/session/acknowledge
pub async fn acknowledge(
    device: DeviceIdentity,
    State(state): State<AppState>,
    Path(lane): Path<String>,
    Json(body): Json<AcknowledgeSelection>,
) -> AppResult<Json<DataResponse<SessionView>>> {
    ensure_lane_access(&device, &lane)?;
    let view = selection::acknowledge(&state, &lane, body).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/lanes/{lane}/session/waitlist
pub async fn choose_waitlist(
    device: DeviceIdentity,
    State(state): State<AppState>,
    Path(lane): Path<String>,
    Json(body): Json<ChooseWaitlist>,
) -> AppResult<Json<DataResponse<SessionView>>> {
    ensure_lane_access(&device, &lane)?;
    let view = selection::choose_waitlist(&state, &lane, body).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/lanes/{lane}/session/assign
pub async fn assign(
    device: DeviceIdentity,
    State(state): State<AppState>,
    Path(lane): Path<String>,
    Json(body): Json<AssignRequest>,
) -> AppResult<Json<DataResponse<SessionView>>> {
    ensure_lane_access(&device, &lane)?;
    let view = selection::assign(&state, &lane, body).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/lanes/{lane}/session/customer-response
pub async fn customer_response(
    device: DeviceIdentity,
    State(state): State<AppState>,
    Path(lane): Path<String>,
    Json(body): Json<CustomerResponse>,
) -> AppResult<Json<DataResponse<SessionView>>> {
    ensure_lane_access(&device, &lane)?;
    let view = selection::customer_response(&state, &lane, body).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/lanes/{lane}/session/payment-intent
pub async fn create_payment_intent(
    device: DeviceIdentity,
    State(state): State<AppState>,
    Path(lane): Path<String>,
) -> AppResult<Json<DataResponse<SessionView>>> {
    ensure_lane_access(&device, &lane)?;
    let view = session::create_payment_intent(&state, &lane).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/lanes/{lane}/session/mark-paid
pub async fn mark_paid(
    device: DeviceIdentity,
    State(state): State<AppState>,
    Path(lane): Path<String>,
) -> AppResult<Json<DataResponse<SessionView>>> {
    ensure_lane_access(&device, &lane)?;
    let view = session::mark_paid(&state, &lane).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/lanes/{lane}/session/sign-agreement
pub async fn sign_agreement(
    device: DeviceIdentity,
    State(state): State<AppState>,
    Path(lane): Path<String>,
    Json(body): Json<SignAgreement>,
) -> AppResult<Json<DataResponse<SessionView>>> {
    ensure_lane_access(&device, &lane)?;
    let view = session::sign_agreement(&state, &lane, body).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/lanes/{lane}/session/reset
pub async fn reset(
    device: DeviceIdentity,
    State(state): State<AppState>,
    Path(lane): Path<String>,
) -> AppResult<Json<DataResponse<SessionView>>> {
    ensure_lane_access(&device, &lane)?;
    let view = session::reset(&state, &lane).await?;
    Ok(Json(DataResponse { data: view }))
}
