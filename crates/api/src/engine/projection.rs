//! Client-facing projections of engine state.
//!
//! Both devices render from the same [`SessionView`] snapshot; events
//! carry the whole view rather than diffs so a reconnecting socket is
//! consistent after its first SESSION_UPDATED.

use frontdesk_core::error::CoreError;
use frontdesk_core::session::SessionStatus;
use frontdesk_core::tier::{RentalType, ALL_TIERS};
use frontdesk_db::models::customer::Customer;
use frontdesk_db::models::lane_session::LaneSession;
use frontdesk_db::repositories::{CustomerRepo, LaneSessionRepo};
use frontdesk_db::DbPool;
use frontdesk_events::SessionView;

use crate::error::{AppError, AppResult};

/// The placeholder view for a lane with no live session. `IDLE` is never
/// stored; it only exists in projections.
pub fn idle_view(lane: &str) -> SessionView {
    SessionView {
        lane: lane.to_string(),
        status: SessionStatus::Idle,
        mode: None,
        session_id: None,
        customer_id: None,
        customer_name: None,
        is_member: None,
        allowed_rentals: Vec::new(),
        proposed_rental_type: None,
        proposed_by: None,
        desired_rental_type: None,
        selection_locked: false,
        selection_acknowledged: false,
        waitlist_desired_type: None,
        backup_rental_type: None,
        assigned_resource_id: None,
        assigned_rental_type: None,
        price_quote: None,
        payment_status: None,
        payment_intent_id: None,
        agreement_signed: false,
    }
}

/// Tiers the customer may rent. Gym day lockers are a membership perk.
fn allowed_rentals_for(customer: &Customer) -> Vec<RentalType> {
    ALL_TIERS
        .iter()
        .copied()
        .filter(|tier| customer.is_member || *tier != RentalType::GymLocker)
        .collect()
}

/// Build the full snapshot for one session row.
pub async fn session_view(pool: &DbPool, session: &LaneSession) -> AppResult<SessionView> {
    let customer = match session.customer_id {
        Some(id) => CustomerRepo::find_by_id(pool, id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "customer",
                id,
            }))?
            .into(),
        None => None::<Customer>,
    };

    Ok(SessionView {
        lane: session.lane_id.clone(),
        status: session.status,
        mode: Some(session.checkin_mode),
        session_id: Some(session.id),
        customer_id: session.customer_id,
        customer_name: customer.as_ref().map(|c| c.name.clone()),
        is_member: customer.as_ref().map(|c| c.is_member),
        allowed_rentals: customer
            .as_ref()
            .map(allowed_rentals_for)
            .unwrap_or_default(),
        proposed_rental_type: session.proposed_rental_type(),
        proposed_by: session.proposed_by(),
        desired_rental_type: session.desired_rental_type(),
        selection_locked: session.selection_locked,
        selection_acknowledged: session.selection_acknowledged,
        waitlist_desired_type: session.waitlist_desired_type(),
        backup_rental_type: session.backup_rental_type(),
        assigned_resource_id: session.assigned_resource_id,
        assigned_rental_type: session.assigned_rental_type(),
        price_quote: session.price_quote.clone(),
        payment_status: Some(session.payment_status),
        payment_intent_id: session.payment_intent_id.clone(),
        agreement_signed: session.disclaimer_ack.is_some(),
    })
}

/// The current view of a lane: its live session, or the idle placeholder.
pub async fn lane_view(pool: &DbPool, lane: &str) -> AppResult<SessionView> {
    match LaneSessionRepo::find_live_by_lane(pool, lane).await? {
        Some(session) => session_view(pool, &session).await,
        None => Ok(idle_view(lane)),
    }
}
