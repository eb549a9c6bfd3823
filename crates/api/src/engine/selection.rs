//! Two-sided tier selection protocol.
//!
//! Either side may propose freely; the first confirm to land wins the
//! selection (a database compare-and-set, not an in-memory lock), and the
//! other side must acknowledge before assignment starts. The losing
//! confirmer gets ALREADY_LOCKED and re-syncs from SESSION_UPDATED.

use frontdesk_core::error::CoreError;
use frontdesk_core::session::{validate_command, SessionCommand, SessionStatus};
use frontdesk_core::waitlist::WaitlistStatus;
use frontdesk_db::models::lane_session::{
    AcknowledgeSelection, AssignRequest, ChooseWaitlist, ConfirmSelection, CustomerResponse,
    ProposeSelection,
};
use frontdesk_db::repositories::{LaneSessionRepo, WaitlistRepo};
use frontdesk_events::{CheckinEvent, SessionView};

use crate::engine::{allocator, publish_session, require_live};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Record a non-authoritative proposal and broadcast it.
pub async fn propose(
    state: &AppState,
    lane: &str,
    request: ProposeSelection,
) -> AppResult<SessionView> {
    let session = require_live(state, lane).await?;
    validate_command(SessionCommand::ProposeSelection, session.status)?;
    if session.selection_locked {
        return Err(AppError::Core(CoreError::AlreadyLocked));
    }

    let updated =
        LaneSessionRepo::propose(&state.pool, session.id, request.rental_type, request.proposed_by)
            .await?;
    if !updated {
        // The other side confirmed between our read and the update.
        return Err(AppError::Core(CoreError::AlreadyLocked));
    }

    state.event_bus.publish(CheckinEvent::SelectionProposed {
        lane: lane.to_string(),
        rental_type: request.rental_type,
        proposed_by: request.proposed_by,
    });

    let session = require_live(state, lane).await?;
    publish_session(state, &session).await
}

/// First-writer-wins confirm: lock the selection to the caller's tier.
pub async fn confirm(
    state: &AppState,
    lane: &str,
    request: ConfirmSelection,
) -> AppResult<SessionView> {
    let session = require_live(state, lane).await?;
    validate_command(SessionCommand::ConfirmSelection, session.status)?;

    let mut tx = state.pool.begin().await?;
    let locked = LaneSessionRepo::confirm_selection(
        &mut *tx,
        session.id,
        request.rental_type,
        request.confirmed_by,
    )
    .await?
    .ok_or(AppError::Core(CoreError::AlreadyLocked))?;
    tx.commit().await?;

    state.event_bus.publish(CheckinEvent::SelectionLocked {
        lane: lane.to_string(),
        rental_type: request.rental_type,
        confirmed_by: request.confirmed_by,
    });

    publish_session(state, &locked).await
}

/// The non-confirming side acknowledges the locked selection; the session
/// advances to assignment.
pub async fn acknowledge(
    state: &AppState,
    lane: &str,
    request: AcknowledgeSelection,
) -> AppResult<SessionView> {
    let session = require_live(state, lane).await?;
    validate_command(SessionCommand::Acknowledge, session.status)?;
    if !session.selection_locked {
        return Err(AppError::Core(CoreError::InvalidState(
            "no locked selection to acknowledge".into(),
        )));
    }
    if session.confirmed_by() == Some(request.acknowledged_by) {
        return Err(AppError::Core(CoreError::Validation(
            "the confirming side cannot acknowledge its own selection".into(),
        )));
    }

    let mut tx = state.pool.begin().await?;
    let advanced = LaneSessionRepo::acknowledge(&mut *tx, session.id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::InvalidState("selection already acknowledged".into()))
        })?;
    tx.commit().await?;

    state.event_bus.publish(CheckinEvent::SelectionAcknowledged {
        lane: lane.to_string(),
        acknowledged_by: request.acknowledged_by,
    });

    publish_session(state, &advanced).await
}

/// Record the fallback the customer accepted when their desired tier had
/// no effective availability. The entry itself is created at completion,
/// when the backup unit is actually consumed.
pub async fn choose_waitlist(
    state: &AppState,
    lane: &str,
    request: ChooseWaitlist,
) -> AppResult<SessionView> {
    let session = require_live(state, lane).await?;
    validate_command(SessionCommand::ChooseWaitlist, session.status)?;
    if request.desired_tier == request.backup_tier {
        return Err(AppError::Core(CoreError::Validation(
            "backup tier must differ from the desired tier".into(),
        )));
    }

    let updated = LaneSessionRepo::set_waitlist_fallback(
        &state.pool,
        session.id,
        request.desired_tier,
        request.backup_tier,
    )
    .await?;
    if !updated {
        return Err(AppError::Core(CoreError::InvalidState(
            "session left the assignment phase".into(),
        )));
    }

    let session = require_live(state, lane).await?;
    publish_session(state, &session).await
}

/// Tentatively assign a unit. Cross-type assignments (tier differs from
/// the locked desire) detour through customer confirmation; nothing is
/// consumed until finalize.
pub async fn assign(state: &AppState, lane: &str, request: AssignRequest) -> AppResult<SessionView> {
    let session = require_live(state, lane).await?;
    validate_command(SessionCommand::Assign, session.status)?;
    let tier = request.rental_type;

    let resource_id = match session.waitlist_entry_id {
        // Fulfilling an upgrade offer: the offered unit is the only valid
        // target, and the hold exempts it from the capacity gate.
        Some(waitlist_id) => {
            let entry = WaitlistRepo::find_by_id(&state.pool, waitlist_id)
                .await?
                .ok_or(AppError::Core(CoreError::NotFound {
                    entity: "waitlist entry",
                    id: waitlist_id,
                }))?;
            if entry.status != WaitlistStatus::Offered {
                return Err(AppError::Core(CoreError::InvalidState(
                    "the upgrade offer is no longer live".into(),
                )));
            }
            if tier != entry.desired_tier {
                return Err(AppError::Core(CoreError::Validation(format!(
                    "upgrade must assign the offered tier {}",
                    entry.desired_tier
                ))));
            }
            entry.resource_id.ok_or_else(|| {
                AppError::Core(CoreError::Internal("offered entry without a unit".into()))
            })?
        }
        None => {
            // Fallback sessions check into their backup tier while their
            // desired demand is already counted; everyone else is a
            // walk-in against effective availability.
            if session.waitlist_desired_type() != Some(tier) {
                allocator::ensure_effective_capacity(&state.pool, tier).await?;
            }
            allocator::select_resource(&state.pool, tier, request.resource_id)
                .await?
                .id
        }
    };

    let requested = session.desired_rental_type();
    let cross_type = requested.is_some_and(|want| want != tier)
        && session.waitlist_desired_type().is_none();
    let new_status = if cross_type {
        SessionStatus::AwaitingCustomer
    } else {
        SessionStatus::AwaitingPayment
    };

    let mut tx = state.pool.begin().await?;
    let updated =
        LaneSessionRepo::set_tentative_assignment(
            &mut *tx,
            session.id,
            resource_id,
            tier,
            new_status.as_str(),
        )
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::InvalidState(
                    "session left the assignment phase".into(),
                ))
            })?;
    tx.commit().await?;

    if cross_type {
        state
            .event_bus
            .publish(CheckinEvent::CustomerConfirmationRequired {
                lane: lane.to_string(),
                // `cross_type` implies the desire is present.
                requested_rental_type: requested.unwrap_or(tier),
                assigned_rental_type: tier,
            });
    }

    publish_session(state, &updated).await
}

/// The customer answers a cross-type assignment prompt.
pub async fn customer_response(
    state: &AppState,
    lane: &str,
    request: CustomerResponse,
) -> AppResult<SessionView> {
    let session = require_live(state, lane).await?;
    validate_command(SessionCommand::CustomerResponse, session.status)?;

    let updated = if request.accepted {
        LaneSessionRepo::accept_cross_type(&state.pool, session.id).await?
    } else {
        LaneSessionRepo::decline_cross_type(&state.pool, session.id).await?
    }
    .ok_or_else(|| {
        AppError::Core(CoreError::InvalidState(
            "no pending customer confirmation".into(),
        ))
    })?;

    let event = if request.accepted {
        CheckinEvent::CustomerConfirmed {
            lane: lane.to_string(),
        }
    } else {
        CheckinEvent::CustomerDeclined {
            lane: lane.to_string(),
        }
    };
    state.event_bus.publish(event);

    publish_session(state, &updated).await
}
