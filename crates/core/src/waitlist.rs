//! Waitlist queue and inventory reservation status models.

use serde::{Deserialize, Serialize};

/// Lifecycle of a waitlist entry.
///
/// `Active → Offered → {Completed | Cancelled | Expired}`. An entry also
/// expires directly from `Active` when its block or visit ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaitlistStatus {
    Active,
    Offered,
    Completed,
    Cancelled,
    Expired,
}

impl WaitlistStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitlistStatus::Active => "ACTIVE",
            WaitlistStatus::Offered => "OFFERED",
            WaitlistStatus::Completed => "COMPLETED",
            WaitlistStatus::Cancelled => "CANCELLED",
            WaitlistStatus::Expired => "EXPIRED",
        }
    }
}

impl std::str::FromStr for WaitlistStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(WaitlistStatus::Active),
            "OFFERED" => Ok(WaitlistStatus::Offered),
            "COMPLETED" => Ok(WaitlistStatus::Completed),
            "CANCELLED" => Ok(WaitlistStatus::Cancelled),
            "EXPIRED" => Ok(WaitlistStatus::Expired),
            other => Err(format!("unknown waitlist status: {other}")),
        }
    }
}

impl TryFrom<String> for WaitlistStatus {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Why an inventory reservation was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReleaseReason {
    Fulfilled,
    Expired,
    Cancelled,
}

impl ReleaseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseReason::Fulfilled => "FULFILLED",
            ReleaseReason::Expired => "EXPIRED",
            ReleaseReason::Cancelled => "CANCELLED",
        }
    }
}

impl std::str::FromStr for ReleaseReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FULFILLED" => Ok(ReleaseReason::Fulfilled),
            "EXPIRED" => Ok(ReleaseReason::Expired),
            "CANCELLED" => Ok(ReleaseReason::Cancelled),
            other => Err(format!("unknown release reason: {other}")),
        }
    }
}

impl TryFrom<String> for ReleaseReason {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Reservation kind. Only upgrade holds exist today; the column is typed
/// so future hold kinds (e.g. maintenance) do not need a migration.
pub const RESERVATION_KIND_UPGRADE_HOLD: &str = "UPGRADE_HOLD";
