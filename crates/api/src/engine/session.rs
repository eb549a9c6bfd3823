//! Session lifecycle commands: start, payment, signing, reset.

use chrono::Utc;

use frontdesk_core::error::CoreError;
use frontdesk_core::payment::PaymentStatus;
use frontdesk_core::session::{validate_command, CheckinMode, SessionCommand, SessionStatus};
use frontdesk_db::models::lane_session::{SignAgreement, StartSession};
use frontdesk_db::repositories::{CustomerRepo, LaneSessionRepo, VisitRepo, WaitlistRepo};
use frontdesk_events::SessionView;

use crate::engine::{allocator, projection, publish_session, require_live};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Minimum age to check in at all.
const MIN_CHECKIN_AGE: i32 = 18;

/// Identity capture: resolve the customer, gate on bans, and open a fresh
/// session for the lane. An existing live session on the lane is replaced
/// (last scan wins); the partial unique index backs that up under races.
pub async fn start(state: &AppState, lane: &str, request: StartSession) -> AppResult<SessionView> {
    let customer = CustomerRepo::upsert_by_scan(&state.pool, &request.identity).await?;

    if customer.is_banned {
        tracing::warn!(customer_id = customer.id, "Rejected banned customer at start");
        return Err(AppError::Core(CoreError::Banned(
            customer
                .ban_reason
                .clone()
                .unwrap_or_else(|| "banned from the premises".into()),
        )));
    }
    if customer.age_at(Utc::now()) < MIN_CHECKIN_AGE {
        return Err(AppError::Core(CoreError::Validation(format!(
            "customers must be at least {MIN_CHECKIN_AGE}"
        ))));
    }

    let mode = request.mode.unwrap_or(CheckinMode::Checkin);

    // Renewals and upgrades extend an existing stay.
    let visit = match mode {
        CheckinMode::Checkin => None,
        CheckinMode::Renewal | CheckinMode::Upgrade => Some(
            VisitRepo::find_open_by_customer(&state.pool, customer.id)
                .await?
                .ok_or_else(|| {
                    AppError::Core(CoreError::Validation(
                        "customer has no open visit to extend".into(),
                    ))
                })?,
        ),
    };

    let mut tx = state.pool.begin().await?;

    if let Some(replaced) = LaneSessionRepo::cancel_live_for_lane(&mut *tx, lane).await? {
        tracing::info!(
            lane,
            replaced_session = replaced.id,
            "Replaced live session on new identity capture"
        );
    }

    let session = LaneSessionRepo::create(
        &mut *tx,
        lane,
        mode,
        customer.id,
        &request.identity.scan_hash,
        visit.as_ref().map(|v| v.id),
    )
    .await?;

    // UPGRADE rides an existing offer: the tier and unit are already
    // decided, so the session skips straight to assignment.
    let session = if mode == CheckinMode::Upgrade {
        let visit_id = visit.as_ref().map(|v| v.id).ok_or_else(|| {
            AppError::Core(CoreError::Internal("upgrade without a visit".into()))
        })?;
        let entry = WaitlistRepo::find_offered_by_visit(&mut *tx, visit_id)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::Validation(
                    "no live upgrade offer for this visit".into(),
                ))
            })?;
        let resource_id = entry.resource_id.ok_or_else(|| {
            AppError::Core(CoreError::Internal("offered entry without a unit".into()))
        })?;
        LaneSessionRepo::prime_upgrade(&mut *tx, session.id, entry.desired_tier, resource_id, entry.id)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::Internal("failed to prime upgrade session".into()))
            })?
    } else {
        session
    };

    tx.commit().await?;

    publish_session(state, &session).await
}

/// Quote the locked assignment and attach a payment intent.
pub async fn create_payment_intent(state: &AppState, lane: &str) -> AppResult<SessionView> {
    let session = require_live(state, lane).await?;
    validate_command(SessionCommand::CreatePaymentIntent, session.status)?;

    let customer_id = session.customer_id.ok_or_else(|| {
        AppError::Core(CoreError::InvalidState("session has no customer".into()))
    })?;
    let customer = CustomerRepo::find_by_id(&state.pool, customer_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "customer",
            id: customer_id,
        }))?;
    let tier = session.assigned_rental_type().ok_or_else(|| {
        AppError::Core(CoreError::InvalidState("no assignment to price".into()))
    })?;

    let now = Utc::now();
    let quote = state
        .quoter
        .quote(tier, customer.age_at(now), now, customer.membership());
    let quote_json = serde_json::to_value(quote)
        .map_err(|e| AppError::InternalError(format!("failed to serialize quote: {e}")))?;
    let intent_id = format!("pi_{}", uuid::Uuid::new_v4().simple());

    let updated = LaneSessionRepo::set_payment_intent(&state.pool, session.id, &intent_id, &quote_json)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::InvalidState("session left the payment phase".into()))
        })?;

    tracing::info!(lane, intent_id = %intent_id, total = quote.total_cents, "Payment intent created");

    publish_session(state, &updated).await
}

/// Record payment. CHECKIN and RENEWAL advance to signing; UPGRADE skips
/// the agreement (the original block's signature still covers the stay)
/// and finalizes immediately.
pub async fn mark_paid(state: &AppState, lane: &str) -> AppResult<SessionView> {
    let session = require_live(state, lane).await?;
    validate_command(SessionCommand::MarkPaid, session.status)?;
    if session.payment_intent_id.is_none() {
        return Err(AppError::Core(CoreError::Validation(
            "create a payment intent before marking paid".into(),
        )));
    }

    let mut tx = state.pool.begin().await?;
    let paid = LaneSessionRepo::mark_paid(
        &mut *tx,
        session.id,
        SessionStatus::AwaitingSignature.as_str(),
    )
    .await?
    .ok_or_else(|| {
        AppError::Core(CoreError::InvalidState("session left the payment phase".into()))
    })?;
    tx.commit().await?;

    if !paid.checkin_mode.requires_signature() {
        let outcome = allocator::finalize(state, &paid, None).await?;
        return projection::session_view(&state.pool, &outcome.session).await;
    }

    publish_session(state, &paid).await
}

/// Capture the signed agreement and finalize the check-in.
///
/// Re-signing after completion is an idempotent replay: the completed
/// view comes back unchanged and no inventory moves.
pub async fn sign_agreement(
    state: &AppState,
    lane: &str,
    request: SignAgreement,
) -> AppResult<SessionView> {
    let session = match LaneSessionRepo::find_live_by_lane(&state.pool, lane).await? {
        Some(session) => session,
        None => {
            // Duplicate submission after the finalize already landed.
            if let Some(latest) = LaneSessionRepo::find_latest_by_lane(&state.pool, lane).await? {
                if latest.status == SessionStatus::Completed && latest.disclaimer_ack.is_some() {
                    tracing::debug!(lane, session = latest.id, "Idempotent sign replay");
                    return projection::session_view(&state.pool, &latest).await;
                }
            }
            return Err(AppError::Core(CoreError::InvalidState(format!(
                "lane {lane} has no active session"
            ))));
        }
    };

    validate_command(SessionCommand::SignAgreement, session.status)?;
    if session.payment_status != PaymentStatus::Paid {
        return Err(AppError::Core(CoreError::InvalidState(
            "payment must be recorded before signing".into(),
        )));
    }

    let outcome = allocator::finalize(state, &session, Some(&request.disclaimer_ack)).await?;
    projection::session_view(&state.pool, &outcome.session).await
}

/// Abandon whatever the lane is doing. Idempotent: resetting an idle lane
/// just re-broadcasts the idle view. Tentative assignments evaporate with
/// the session; no inventory was consumed.
pub async fn reset(state: &AppState, lane: &str) -> AppResult<SessionView> {
    let mut tx = state.pool.begin().await?;
    let cancelled = LaneSessionRepo::cancel_live_for_lane(&mut *tx, lane).await?;
    tx.commit().await?;

    if let Some(session) = cancelled {
        tracing::info!(lane, session = session.id, "Lane reset");
    }

    let view = projection::idle_view(lane);
    state
        .event_bus
        .publish(frontdesk_events::CheckinEvent::SessionUpdated {
            lane: lane.to_string(),
            session: view.clone(),
        });
    Ok(view)
}
