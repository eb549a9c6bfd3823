//! The closed union of engine events.

use serde::{Deserialize, Serialize};

use frontdesk_core::payment::PaymentStatus;
use frontdesk_core::session::{Actor, CheckinMode, SessionStatus};
use frontdesk_core::tier::RentalType;
use frontdesk_core::types::{DbId, Timestamp};

/// Full projected view of one lane, pushed on every session transition.
///
/// Clients must treat this as a replace-the-projection snapshot, never a
/// diff: delivery is at-most-once and reconnects can skip events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub lane: String,
    pub status: SessionStatus,
    pub mode: Option<CheckinMode>,
    pub session_id: Option<DbId>,
    pub customer_id: Option<DbId>,
    pub customer_name: Option<String>,
    pub is_member: Option<bool>,
    /// Tiers the customer may rent (staff overrides can restrict these).
    pub allowed_rentals: Vec<RentalType>,
    /// Latest non-authoritative proposal, if any.
    pub proposed_rental_type: Option<RentalType>,
    pub proposed_by: Option<Actor>,
    /// Authoritative tier once the selection is locked.
    pub desired_rental_type: Option<RentalType>,
    pub selection_locked: bool,
    pub selection_acknowledged: bool,
    /// Fallback demand recorded when the desired tier was unavailable.
    pub waitlist_desired_type: Option<RentalType>,
    pub backup_rental_type: Option<RentalType>,
    /// Tentative assignment (not yet occupied until completion).
    pub assigned_resource_id: Option<DbId>,
    pub assigned_rental_type: Option<RentalType>,
    pub price_quote: Option<serde_json::Value>,
    pub payment_status: Option<PaymentStatus>,
    pub payment_intent_id: Option<String>,
    pub agreement_signed: bool,
}

/// Per-tier availability snapshot.
///
/// `effective = max(0, raw_clean - queued_demand)`: outstanding waitlist
/// demand for a tier shields its last clean units from walk-ins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierAvailability {
    pub rental_type: RentalType,
    pub raw_clean: i64,
    pub queued_demand: i64,
    pub effective: i64,
}

/// Every event the engine can emit, one variant per wire event type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckinEvent {
    SessionUpdated {
        lane: String,
        session: SessionView,
    },
    SelectionProposed {
        lane: String,
        rental_type: RentalType,
        proposed_by: Actor,
    },
    SelectionLocked {
        lane: String,
        rental_type: RentalType,
        confirmed_by: Actor,
    },
    SelectionAcknowledged {
        lane: String,
        acknowledged_by: Actor,
    },
    CustomerConfirmationRequired {
        lane: String,
        requested_rental_type: RentalType,
        assigned_rental_type: RentalType,
    },
    CustomerConfirmed {
        lane: String,
    },
    CustomerDeclined {
        lane: String,
    },
    AssignmentCreated {
        lane: String,
        resource_id: DbId,
        rental_type: RentalType,
        visit_id: DbId,
        checkin_block_id: DbId,
    },
    AssignmentFailed {
        lane: String,
        rental_type: RentalType,
        message: String,
        availability: Vec<TierAvailability>,
    },
    WaitlistCreated {
        waitlist_id: DbId,
        desired_tier: RentalType,
        backup_tier: Option<RentalType>,
        lane: Option<String>,
    },
    WaitlistUpdated {
        waitlist_id: DbId,
        desired_tier: RentalType,
        status: frontdesk_core::waitlist::WaitlistStatus,
    },
    UpgradeHoldAvailable {
        waitlist_id: DbId,
        resource_id: DbId,
        rental_type: RentalType,
        offer_expires_at: Timestamp,
    },
    UpgradeOfferExpired {
        waitlist_id: DbId,
        resource_id: DbId,
        rental_type: RentalType,
    },
    InventoryUpdated {
        availability: Vec<TierAvailability>,
    },
}

/// Fieldless mirror of [`CheckinEvent`], used for subscription filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    SessionUpdated,
    SelectionProposed,
    SelectionLocked,
    SelectionAcknowledged,
    CustomerConfirmationRequired,
    CustomerConfirmed,
    CustomerDeclined,
    AssignmentCreated,
    AssignmentFailed,
    WaitlistCreated,
    WaitlistUpdated,
    UpgradeHoldAvailable,
    UpgradeOfferExpired,
    InventoryUpdated,
}

impl CheckinEvent {
    /// The subscription kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            CheckinEvent::SessionUpdated { .. } => EventKind::SessionUpdated,
            CheckinEvent::SelectionProposed { .. } => EventKind::SelectionProposed,
            CheckinEvent::SelectionLocked { .. } => EventKind::SelectionLocked,
            CheckinEvent::SelectionAcknowledged { .. } => EventKind::SelectionAcknowledged,
            CheckinEvent::CustomerConfirmationRequired { .. } => {
                EventKind::CustomerConfirmationRequired
            }
            CheckinEvent::CustomerConfirmed { .. } => EventKind::CustomerConfirmed,
            CheckinEvent::CustomerDeclined { .. } => EventKind::CustomerDeclined,
            CheckinEvent::AssignmentCreated { .. } => EventKind::AssignmentCreated,
            CheckinEvent::AssignmentFailed { .. } => EventKind::AssignmentFailed,
            CheckinEvent::WaitlistCreated { .. } => EventKind::WaitlistCreated,
            CheckinEvent::WaitlistUpdated { .. } => EventKind::WaitlistUpdated,
            CheckinEvent::UpgradeHoldAvailable { .. } => EventKind::UpgradeHoldAvailable,
            CheckinEvent::UpgradeOfferExpired { .. } => EventKind::UpgradeOfferExpired,
            CheckinEvent::InventoryUpdated { .. } => EventKind::InventoryUpdated,
        }
    }

    /// The lane this event is scoped to, if any.
    ///
    /// Lane-scoped events are only delivered to sockets attached to that
    /// lane; unscoped events (inventory, waitlist sweeps) go to every
    /// subscriber of the kind.
    pub fn lane(&self) -> Option<&str> {
        match self {
            CheckinEvent::SessionUpdated { lane, .. }
            | CheckinEvent::SelectionProposed { lane, .. }
            | CheckinEvent::SelectionLocked { lane, .. }
            | CheckinEvent::SelectionAcknowledged { lane, .. }
            | CheckinEvent::CustomerConfirmationRequired { lane, .. }
            | CheckinEvent::CustomerConfirmed { lane }
            | CheckinEvent::CustomerDeclined { lane }
            | CheckinEvent::AssignmentCreated { lane, .. }
            | CheckinEvent::AssignmentFailed { lane, .. } => Some(lane),
            CheckinEvent::WaitlistCreated { lane, .. } => lane.as_deref(),
            CheckinEvent::WaitlistUpdated { .. }
            | CheckinEvent::UpgradeHoldAvailable { .. }
            | CheckinEvent::UpgradeOfferExpired { .. }
            | CheckinEvent::InventoryUpdated { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_screaming_type_tag() {
        let event = CheckinEvent::SelectionLocked {
            lane: "lane-1".into(),
            rental_type: RentalType::Standard,
            confirmed_by: Actor::Employee,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "SELECTION_LOCKED");
        assert_eq!(json["rental_type"], "STANDARD");
        assert_eq!(json["confirmed_by"], "EMPLOYEE");
    }

    #[test]
    fn lane_scoping() {
        let scoped = CheckinEvent::CustomerConfirmed {
            lane: "lane-2".into(),
        };
        assert_eq!(scoped.lane(), Some("lane-2"));

        let unscoped = CheckinEvent::InventoryUpdated {
            availability: vec![],
        };
        assert_eq!(unscoped.lane(), None);
    }

    #[test]
    fn kind_matches_wire_tag() {
        let event = CheckinEvent::UpgradeHoldAvailable {
            waitlist_id: 9,
            resource_id: 3,
            rental_type: RentalType::Double,
            offer_expires_at: chrono::Utc::now(),
        };
        assert_eq!(event.kind(), EventKind::UpgradeHoldAvailable);

        let kind_json = serde_json::to_value(event.kind()).unwrap();
        let event_json = serde_json::to_value(&event).unwrap();
        assert_eq!(kind_json, event_json["type"]);
    }

    #[test]
    fn event_round_trips_through_json() {
        let event = CheckinEvent::WaitlistCreated {
            waitlist_id: 14,
            desired_tier: RentalType::Special,
            backup_tier: Some(RentalType::Standard),
            lane: Some("lane-1".into()),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: CheckinEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind(), EventKind::WaitlistCreated);
        assert_eq!(back.lane(), Some("lane-1"));
    }
}
