//! Lane-session state machine rules.
//!
//! The validity table lives here (zero-dep, pure) so the API engine can
//! re-validate every command inside the same transaction that mutates the
//! session, and so the table is testable without a database. The engine
//! must treat a failed validation as `INVALID_STATE` and leave the session
//! untouched.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lane-session lifecycle.
///
/// `Idle` is never stored: it is the projection placeholder for a lane
/// with no live session. At most one non-terminal row exists per lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Idle,
    Active,
    AwaitingCustomer,
    AwaitingAssignment,
    AwaitingPayment,
    AwaitingSignature,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "IDLE",
            SessionStatus::Active => "ACTIVE",
            SessionStatus::AwaitingCustomer => "AWAITING_CUSTOMER",
            SessionStatus::AwaitingAssignment => "AWAITING_ASSIGNMENT",
            SessionStatus::AwaitingPayment => "AWAITING_PAYMENT",
            SessionStatus::AwaitingSignature => "AWAITING_SIGNATURE",
            SessionStatus::Completed => "COMPLETED",
            SessionStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IDLE" => Ok(SessionStatus::Idle),
            "ACTIVE" => Ok(SessionStatus::Active),
            "AWAITING_CUSTOMER" => Ok(SessionStatus::AwaitingCustomer),
            "AWAITING_ASSIGNMENT" => Ok(SessionStatus::AwaitingAssignment),
            "AWAITING_PAYMENT" => Ok(SessionStatus::AwaitingPayment),
            "AWAITING_SIGNATURE" => Ok(SessionStatus::AwaitingSignature),
            "COMPLETED" => Ok(SessionStatus::Completed),
            "CANCELLED" => Ok(SessionStatus::Cancelled),
            other => Err(format!("unknown session status: {other}")),
        }
    }
}

impl TryFrom<String> for SessionStatus {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Which side of the lane issued a selection action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Actor {
    /// The kiosk (customer-facing device).
    Customer,
    /// The register (staff-facing device).
    Employee,
}

impl Actor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Actor::Customer => "CUSTOMER",
            Actor::Employee => "EMPLOYEE",
        }
    }

    pub fn other(&self) -> Actor {
        match self {
            Actor::Customer => Actor::Employee,
            Actor::Employee => Actor::Customer,
        }
    }
}

impl std::str::FromStr for Actor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CUSTOMER" => Ok(Actor::Customer),
            "EMPLOYEE" => Ok(Actor::Employee),
            other => Err(format!("unknown actor: {other}")),
        }
    }
}

impl TryFrom<String> for Actor {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Why the session exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckinMode {
    Checkin,
    Renewal,
    Upgrade,
}

impl CheckinMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckinMode::Checkin => "CHECKIN",
            CheckinMode::Renewal => "RENEWAL",
            CheckinMode::Upgrade => "UPGRADE",
        }
    }

    /// Agreement signing is not required for UPGRADE-mode blocks.
    pub fn requires_signature(&self) -> bool {
        !matches!(self, CheckinMode::Upgrade)
    }
}

impl std::str::FromStr for CheckinMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CHECKIN" => Ok(CheckinMode::Checkin),
            "RENEWAL" => Ok(CheckinMode::Renewal),
            "UPGRADE" => Ok(CheckinMode::Upgrade),
            other => Err(format!("unknown check-in mode: {other}")),
        }
    }
}

impl TryFrom<String> for CheckinMode {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Priced time window kinds within a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockKind {
    Initial,
    Renewal,
    Final2h,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Initial => "INITIAL",
            BlockKind::Renewal => "RENEWAL",
            BlockKind::Final2h => "FINAL2H",
        }
    }
}

impl std::str::FromStr for BlockKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INITIAL" => Ok(BlockKind::Initial),
            "RENEWAL" => Ok(BlockKind::Renewal),
            "FINAL2H" => Ok(BlockKind::Final2h),
            other => Err(format!("unknown block kind: {other}")),
        }
    }
}

impl TryFrom<String> for BlockKind {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Commands the two devices can issue against a lane session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    ProposeSelection,
    ConfirmSelection,
    Acknowledge,
    ChooseWaitlist,
    Assign,
    CustomerResponse,
    CreatePaymentIntent,
    MarkPaid,
    SignAgreement,
    Reset,
}

impl SessionCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionCommand::ProposeSelection => "propose_selection",
            SessionCommand::ConfirmSelection => "confirm_selection",
            SessionCommand::Acknowledge => "acknowledge",
            SessionCommand::ChooseWaitlist => "choose_waitlist",
            SessionCommand::Assign => "assign",
            SessionCommand::CustomerResponse => "customer_response",
            SessionCommand::CreatePaymentIntent => "create_payment_intent",
            SessionCommand::MarkPaid => "mark_paid",
            SessionCommand::SignAgreement => "sign_agreement",
            SessionCommand::Reset => "reset",
        }
    }

    /// Source states in which this command is valid.
    pub fn valid_in(&self) -> &'static [SessionStatus] {
        use SessionStatus::*;
        match self {
            SessionCommand::ProposeSelection => &[Active],
            SessionCommand::ConfirmSelection => &[Active],
            SessionCommand::Acknowledge => &[Active],
            SessionCommand::ChooseWaitlist => &[AwaitingAssignment],
            SessionCommand::Assign => &[AwaitingAssignment],
            SessionCommand::CustomerResponse => &[AwaitingCustomer],
            SessionCommand::CreatePaymentIntent => &[AwaitingPayment],
            SessionCommand::MarkPaid => &[AwaitingPayment],
            SessionCommand::SignAgreement => &[AwaitingSignature],
            SessionCommand::Reset => &[
                Active,
                AwaitingCustomer,
                AwaitingAssignment,
                AwaitingPayment,
                AwaitingSignature,
            ],
        }
    }
}

/// Check a command against the session's current status.
///
/// Returns `CoreError::InvalidState` with a message naming the command
/// and the current state; the caller must not have mutated anything yet.
pub fn validate_command(
    command: SessionCommand,
    current: SessionStatus,
) -> Result<(), CoreError> {
    if command.valid_in().contains(&current) {
        Ok(())
    } else {
        Err(CoreError::InvalidState(format!(
            "{} is not valid while the session is {}",
            command.as_str(),
            current.as_str(),
        )))
    }
}
