use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use frontdesk_core::payment::PaymentStatus;
use frontdesk_core::session::{Actor, CheckinMode, SessionStatus};
use frontdesk_core::tier::RentalType;
use frontdesk_core::types::{DbId, Timestamp};

/// A row from the `lane_sessions` table: one active negotiation per
/// physical lane.
///
/// Nullable enum columns stay `Option<String>` with typed accessors; the
/// CHECK constraints guarantee stored values parse.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LaneSession {
    pub id: DbId,
    pub lane_id: String,
    #[sqlx(try_from = "String")]
    pub status: SessionStatus,
    #[sqlx(try_from = "String")]
    pub checkin_mode: CheckinMode,
    pub customer_id: Option<DbId>,
    pub scan_hash: Option<String>,
    proposed_rental_type: Option<String>,
    proposed_by: Option<String>,
    desired_rental_type: Option<String>,
    pub selection_locked: bool,
    confirmed_by: Option<String>,
    pub selection_acknowledged: bool,
    waitlist_desired_type: Option<String>,
    backup_rental_type: Option<String>,
    pub assigned_resource_id: Option<DbId>,
    assigned_rental_type: Option<String>,
    pub price_quote: Option<serde_json::Value>,
    pub disclaimer_ack: Option<serde_json::Value>,
    pub payment_intent_id: Option<String>,
    #[sqlx(try_from = "String")]
    pub payment_status: PaymentStatus,
    pub visit_id: Option<DbId>,
    pub checkin_block_id: Option<DbId>,
    pub waitlist_entry_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl LaneSession {
    pub fn proposed_rental_type(&self) -> Option<RentalType> {
        self.proposed_rental_type
            .as_deref()
            .and_then(|s| s.parse().ok())
    }

    pub fn proposed_by(&self) -> Option<Actor> {
        self.proposed_by.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn desired_rental_type(&self) -> Option<RentalType> {
        self.desired_rental_type
            .as_deref()
            .and_then(|s| s.parse().ok())
    }

    pub fn confirmed_by(&self) -> Option<Actor> {
        self.confirmed_by.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn waitlist_desired_type(&self) -> Option<RentalType> {
        self.waitlist_desired_type
            .as_deref()
            .and_then(|s| s.parse().ok())
    }

    pub fn backup_rental_type(&self) -> Option<RentalType> {
        self.backup_rental_type
            .as_deref()
            .and_then(|s| s.parse().ok())
    }

    pub fn assigned_rental_type(&self) -> Option<RentalType> {
        self.assigned_rental_type
            .as_deref()
            .and_then(|s| s.parse().ok())
    }
}

/// Body for `POST /lanes/{lane}/session/start`.
#[derive(Debug, Deserialize)]
pub struct StartSession {
    pub identity: crate::models::customer::CapturedIdentity,
    /// Defaults to CHECKIN when absent.
    pub mode: Option<CheckinMode>,
}

/// Body for `POST /lanes/{lane}/session/propose`.
#[derive(Debug, Deserialize)]
pub struct ProposeSelection {
    pub rental_type: RentalType,
    pub proposed_by: Actor,
}

/// Body for `POST /lanes/{lane}/session/confirm`. Carries the confirming
/// side's authoritative tier: when both sides race, whichever confirm the
/// database applies first decides the selection.
#[derive(Debug, Deserialize)]
pub struct ConfirmSelection {
    pub rental_type: RentalType,
    pub confirmed_by: Actor,
}

/// Body for `POST /lanes/{lane}/session/acknowledge`.
#[derive(Debug, Deserialize)]
pub struct AcknowledgeSelection {
    pub acknowledged_by: Actor,
}

/// Body for `POST /lanes/{lane}/session/waitlist`: the fallback the
/// customer accepted when their desired tier was unavailable.
#[derive(Debug, Deserialize)]
pub struct ChooseWaitlist {
    pub desired_tier: RentalType,
    pub backup_tier: RentalType,
}

/// Body for `POST /lanes/{lane}/session/assign`.
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub rental_type: RentalType,
    /// Explicit unit override; auto-selected when absent.
    pub resource_id: Option<DbId>,
}

/// Body for `POST /lanes/{lane}/session/customer-response`.
#[derive(Debug, Deserialize)]
pub struct CustomerResponse {
    pub accepted: bool,
}

/// Body for `POST /lanes/{lane}/session/sign-agreement`.
#[derive(Debug, Deserialize)]
pub struct SignAgreement {
    /// Opaque acknowledgement artifact (signature vector, consent flags).
    pub disclaimer_ack: serde_json::Value,
}
