//! Inventory math and the transactional finalize step.
//!
//! Effective availability is `max(0, raw CLEAN - open waitlist demand)`:
//! outstanding ACTIVE/OFFERED entries shield a tier's last clean units
//! from walk-ins. Reservation-held units still count as raw CLEAN (each
//! live hold pairs 1:1 with an OFFERED entry already in the demand term);
//! they are excluded at candidate-selection time instead.
//!
//! Nothing before [`finalize`] consumes inventory. The finalize
//! transaction re-reads the unit under `FOR UPDATE`, re-verifies
//! eligibility and effective capacity, and only then flips it OCCUPIED
//! together with the visit,
//! block, waitlist and session writes. A lost race rolls everything back
//! and surfaces ASSIGNMENT_FAILED with a fresh availability snapshot.

use chrono::{Duration, Utc};

use frontdesk_core::error::CoreError;
use frontdesk_core::resource::ResourceStatus;
use frontdesk_core::session::{BlockKind, CheckinMode};
use frontdesk_core::tier::{RentalType, ALL_TIERS};
use frontdesk_core::waitlist::{ReleaseReason, WaitlistStatus};
use frontdesk_db::models::checkin_block::CheckinBlock;
use frontdesk_db::models::lane_session::LaneSession;
use frontdesk_db::models::resource::Resource;
use frontdesk_db::models::visit::Visit;
use frontdesk_db::models::waitlist::WaitlistEntry;
use frontdesk_db::repositories::{
    CheckinBlockRepo, LaneSessionRepo, ReservationRepo, ResourceRepo, VisitRepo, WaitlistRepo,
};
use frontdesk_db::DbPool;
use frontdesk_events::{CheckinEvent, TierAvailability};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Everything the finalize transaction produced.
pub struct CheckinOutcome {
    pub session: LaneSession,
    pub visit: Visit,
    pub block: CheckinBlock,
    /// Fallback-path entry created at completion, if any.
    pub waitlist_entry: Option<WaitlistEntry>,
}

fn none_available(tier: RentalType) -> AppError {
    let noun = if tier.is_room() { "rooms" } else { "lockers" };
    AppError::Core(CoreError::NoAvailableResource(format!(
        "No available {noun}"
    )))
}

fn assignment_failed(msg: impl Into<String>) -> AppError {
    AppError::Core(CoreError::AssignmentFailed(msg.into()))
}

/// Per-tier availability, in tier display order.
pub async fn availability_snapshot(pool: &DbPool) -> AppResult<Vec<TierAvailability>> {
    let mut out = Vec::with_capacity(ALL_TIERS.len());
    for tier in ALL_TIERS {
        let raw_clean = ResourceRepo::count_clean(pool, tier).await?;
        let queued_demand = WaitlistRepo::count_open_for_tier(pool, tier).await?;
        out.push(TierAvailability {
            rental_type: tier,
            raw_clean,
            queued_demand,
            effective: (raw_clean - queued_demand).max(0),
        });
    }
    Ok(out)
}

/// Gate walk-in demand on effective availability. Waitlist-fulfilling
/// sessions skip this: their unit is covered by their own reservation.
pub async fn ensure_effective_capacity(pool: &DbPool, tier: RentalType) -> AppResult<()> {
    let raw = ResourceRepo::count_clean(pool, tier).await?;
    let queued = WaitlistRepo::count_open_for_tier(pool, tier).await?;
    if raw - queued <= 0 {
        tracing::info!(tier = %tier, raw, queued, "Effective availability exhausted");
        return Err(none_available(tier));
    }
    Ok(())
}

/// Pick the unit for a tentative assignment: the staff's explicit choice
/// (validated), or the lowest-numbered eligible unit.
pub async fn select_resource(
    pool: &DbPool,
    tier: RentalType,
    explicit: Option<i64>,
) -> AppResult<Resource> {
    match explicit {
        Some(id) => {
            let resource = ResourceRepo::find_by_id(pool, id).await?.ok_or(
                AppError::Core(CoreError::NotFound {
                    entity: "resource",
                    id,
                }),
            )?;
            if resource.rental_type != tier {
                return Err(AppError::Core(CoreError::Validation(format!(
                    "unit {} is {}, not {}",
                    resource.number, resource.rental_type, tier
                ))));
            }
            if resource.status != ResourceStatus::Clean
                || resource.assigned_to_customer_id.is_some()
            {
                return Err(assignment_failed(format!(
                    "unit {} is not available",
                    resource.number
                )));
            }
            if ReservationRepo::find_open_for_resource(pool, id)
                .await?
                .is_some()
            {
                return Err(assignment_failed(format!(
                    "unit {} is held for an upgrade offer",
                    resource.number
                )));
            }
            Ok(resource)
        }
        None => ResourceRepo::pick_candidate(pool, tier)
            .await?
            .ok_or_else(|| none_available(tier)),
    }
}

/// Atomically consume the session's tentative assignment.
///
/// On success the resource is OCCUPIED, the visit and block exist, any
/// fallback demand is queued, any fulfilled offer is closed out, and the
/// session is COMPLETED. Publishes ASSIGNMENT_CREATED (plus
/// WAITLIST_CREATED, INVENTORY_UPDATED, SESSION_UPDATED) after commit, or
/// ASSIGNMENT_FAILED with fresh availability after rollback.
pub async fn finalize(
    state: &AppState,
    session: &LaneSession,
    disclaimer_ack: Option<&serde_json::Value>,
) -> AppResult<CheckinOutcome> {
    let tier = session
        .assigned_rental_type()
        .ok_or_else(|| AppError::Core(CoreError::InvalidState("no assigned tier".into())))?;

    match finalize_in_tx(state, session, tier, disclaimer_ack).await {
        Ok(outcome) => {
            // The block row always links its unit; created above from the
            // session's assignment.
            let resource_id = outcome.block.resource_id.unwrap_or_default();
            state.event_bus.publish(CheckinEvent::AssignmentCreated {
                lane: session.lane_id.clone(),
                resource_id,
                rental_type: tier,
                visit_id: outcome.visit.id,
                checkin_block_id: outcome.block.id,
            });
            if let Some(entry) = &outcome.waitlist_entry {
                state.event_bus.publish(CheckinEvent::WaitlistCreated {
                    waitlist_id: entry.id,
                    desired_tier: entry.desired_tier,
                    backup_tier: entry.backup_tier(),
                    lane: Some(session.lane_id.clone()),
                });
            }
            let availability = availability_snapshot(&state.pool).await?;
            state
                .event_bus
                .publish(CheckinEvent::InventoryUpdated { availability });
            super::publish_session(state, &outcome.session).await?;
            Ok(outcome)
        }
        Err(err) => {
            if let AppError::Core(CoreError::AssignmentFailed(msg)) = &err {
                tracing::warn!(
                    lane = %session.lane_id,
                    tier = %tier,
                    reason = %msg,
                    "Finalize lost an allocation race"
                );
                let availability = availability_snapshot(&state.pool).await.unwrap_or_default();
                state.event_bus.publish(CheckinEvent::AssignmentFailed {
                    lane: session.lane_id.clone(),
                    rental_type: tier,
                    message: msg.clone(),
                    availability,
                });
            }
            Err(err)
        }
    }
}

async fn finalize_in_tx(
    state: &AppState,
    session: &LaneSession,
    tier: RentalType,
    disclaimer_ack: Option<&serde_json::Value>,
) -> AppResult<CheckinOutcome> {
    let customer_id = session
        .customer_id
        .ok_or_else(|| AppError::Core(CoreError::InvalidState("session has no customer".into())))?;
    let resource_id = session
        .assigned_resource_id
        .ok_or_else(|| AppError::Core(CoreError::InvalidState("no assigned unit".into())))?;

    let mut tx = state.pool.begin().await?;

    // Serialize against every other attempt to consume this unit.
    let resource = ResourceRepo::lock_for_assignment(&mut *tx, resource_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "resource",
            id: resource_id,
        }))?;

    if resource.status != ResourceStatus::Clean || resource.assigned_to_customer_id.is_some() {
        return Err(assignment_failed(format!(
            "unit {} was taken",
            resource.number
        )));
    }

    // A live hold on the unit blocks everyone except the session that is
    // fulfilling the hold's own waitlist entry.
    if let Some(reservation) = ReservationRepo::find_open_for_resource(&mut *tx, resource_id).await?
    {
        if session.waitlist_entry_id != Some(reservation.waitlist_id) {
            return Err(assignment_failed(format!(
                "unit {} is held for an upgrade offer",
                resource.number
            )));
        }
    }

    // The shield holds until the moment of consumption: demand queued
    // after the tentative assignment still protects this unit. Sessions
    // fulfilling their own offer are exempt; their entry is in the demand
    // term and their unit is covered by the paired hold.
    if session.waitlist_entry_id.is_none() {
        let raw = ResourceRepo::count_clean(&mut *tx, tier).await?;
        let queued = WaitlistRepo::count_open_for_tier(&mut *tx, tier).await?;
        if raw - queued <= 0 {
            tracing::info!(tier = %tier, raw, queued, "Demand outgrew supply before finalize");
            return Err(none_available(tier));
        }
    }

    // Fulfilling an offer: the entry must still be live and pointing at
    // this unit. Close it out and release the hold.
    if let Some(waitlist_id) = session.waitlist_entry_id {
        let entry = WaitlistRepo::lock_by_id(&mut *tx, waitlist_id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "waitlist entry",
                id: waitlist_id,
            }))?;
        if entry.status != WaitlistStatus::Offered || entry.resource_id != Some(resource_id) {
            return Err(assignment_failed("the upgrade offer is no longer live"));
        }
        if !WaitlistRepo::complete(&mut *tx, waitlist_id).await? {
            return Err(assignment_failed("the upgrade offer is no longer live"));
        }
        ReservationRepo::release_for_waitlist(&mut *tx, waitlist_id, ReleaseReason::Fulfilled)
            .await?;
    }

    if !ResourceRepo::occupy(&mut *tx, resource_id, customer_id).await? {
        return Err(assignment_failed(format!(
            "unit {} was taken",
            resource.number
        )));
    }

    // Moving up a tier vacates the old unit back into the cleaning cycle.
    if session.checkin_mode == CheckinMode::Upgrade {
        if let Some(previous) =
            ResourceRepo::find_occupied_by_customer(&mut *tx, customer_id, resource_id).await?
        {
            ResourceRepo::vacate(&mut *tx, previous.id).await?;
            tracing::info!(
                customer_id,
                from_unit = previous.number,
                to_unit = resource.number,
                "Upgrade move-out"
            );
        }
    }

    let visit = match session.visit_id {
        Some(id) => VisitRepo::find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound { entity: "visit", id }))?,
        None => VisitRepo::create(&mut *tx, customer_id).await?,
    };

    let kind = match session.checkin_mode {
        CheckinMode::Checkin => BlockKind::Initial,
        CheckinMode::Renewal | CheckinMode::Upgrade => BlockKind::Renewal,
    };
    let ends_at = Utc::now() + Duration::hours(state.config.block_hours);
    let block = CheckinBlockRepo::create(
        &mut *tx,
        visit.id,
        kind,
        tier,
        resource_id,
        session.price_quote.as_ref(),
        ends_at,
    )
    .await?;

    // Fallback path: record the unmet demand now that the backup unit is
    // actually consumed.
    let waitlist_entry = match session.waitlist_desired_type() {
        Some(desired) => Some(
            WaitlistRepo::create(
                &mut *tx,
                visit.id,
                block.id,
                desired,
                session.backup_rental_type(),
            )
            .await?,
        ),
        None => None,
    };

    let session = LaneSessionRepo::complete(&mut *tx, session.id, visit.id, block.id, disclaimer_ack)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::InvalidState(
                "session was cancelled or completed concurrently".into(),
            ))
        })?;

    tx.commit().await?;

    Ok(CheckinOutcome {
        session,
        visit,
        block,
        waitlist_entry,
    })
}
