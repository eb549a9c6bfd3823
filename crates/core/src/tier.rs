//! Rental tiers (resource classes).
//!
//! Tiers are stored as TEXT in the database and serialized as
//! SCREAMING_SNAKE_CASE on the wire. `TryFrom<String>` exists so the db
//! crate can decode rows via `#[sqlx(try_from = "String")]` without this
//! crate depending on sqlx.

use serde::{Deserialize, Serialize};

/// A rental class. Rooms come in STANDARD/DOUBLE/SPECIAL; lockers in
/// LOCKER/GYM_LOCKER.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RentalType {
    Locker,
    Standard,
    Double,
    Special,
    GymLocker,
}

/// All tiers, in display order. Used by availability snapshots and the
/// upgrade-hold sweep (which iterates every tier per tick).
pub const ALL_TIERS: [RentalType; 5] = [
    RentalType::Locker,
    RentalType::Standard,
    RentalType::Double,
    RentalType::Special,
    RentalType::GymLocker,
];

impl RentalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RentalType::Locker => "LOCKER",
            RentalType::Standard => "STANDARD",
            RentalType::Double => "DOUBLE",
            RentalType::Special => "SPECIAL",
            RentalType::GymLocker => "GYM_LOCKER",
        }
    }

    /// Whether this tier is fulfilled by a room (as opposed to a locker).
    /// Drives the "No available rooms" vs "No available lockers" message.
    pub fn is_room(&self) -> bool {
        matches!(
            self,
            RentalType::Standard | RentalType::Double | RentalType::Special
        )
    }
}

impl std::fmt::Display for RentalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RentalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOCKER" => Ok(RentalType::Locker),
            "STANDARD" => Ok(RentalType::Standard),
            "DOUBLE" => Ok(RentalType::Double),
            "SPECIAL" => Ok(RentalType::Special),
            "GYM_LOCKER" => Ok(RentalType::GymLocker),
            other => Err(format!("unknown rental type: {other}")),
        }
    }
}

impl TryFrom<String> for RentalType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for tier in ALL_TIERS {
            assert_eq!(tier.as_str().parse::<RentalType>().unwrap(), tier);
        }
    }

    #[test]
    fn serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&RentalType::GymLocker).unwrap();
        assert_eq!(json, "\"GYM_LOCKER\"");
    }

    #[test]
    fn rooms_and_lockers_split() {
        assert!(RentalType::Standard.is_room());
        assert!(RentalType::Double.is_room());
        assert!(RentalType::Special.is_room());
        assert!(!RentalType::Locker.is_room());
        assert!(!RentalType::GymLocker.is_room());
    }
}
