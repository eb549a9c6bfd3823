//! Resource (room/locker) status model.

use serde::{Deserialize, Serialize};

/// Physical kind of a resource row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    Room,
    Locker,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Room => "ROOM",
            ResourceKind::Locker => "LOCKER",
        }
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ROOM" => Ok(ResourceKind::Room),
            "LOCKER" => Ok(ResourceKind::Locker),
            other => Err(format!("unknown resource kind: {other}")),
        }
    }
}

impl TryFrom<String> for ResourceKind {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Cleaning/occupancy lifecycle of a resource.
///
/// Invariant (DB CHECK + every write path): `Occupied` iff
/// `assigned_to_customer_id` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceStatus {
    Dirty,
    Cleaning,
    Clean,
    Occupied,
}

impl ResourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceStatus::Dirty => "DIRTY",
            ResourceStatus::Cleaning => "CLEANING",
            ResourceStatus::Clean => "CLEAN",
            ResourceStatus::Occupied => "OCCUPIED",
        }
    }
}

impl std::str::FromStr for ResourceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DIRTY" => Ok(ResourceStatus::Dirty),
            "CLEANING" => Ok(ResourceStatus::Cleaning),
            "CLEAN" => Ok(ResourceStatus::Clean),
            "OCCUPIED" => Ok(ResourceStatus::Occupied),
            other => Err(format!("unknown resource status: {other}")),
        }
    }
}

impl TryFrom<String> for ResourceStatus {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
