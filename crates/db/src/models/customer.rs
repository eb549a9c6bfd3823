use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use frontdesk_core::pricing::Membership;
use frontdesk_core::types::{DbId, Timestamp};

/// A row from the `customers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Customer {
    pub id: DbId,
    pub name: String,
    pub date_of_birth: NaiveDate,
    /// Stable hash of the scanned identity document. Scanning the same
    /// document twice resolves to the same customer row.
    pub scan_hash: String,
    pub is_member: bool,
    pub is_banned: bool,
    pub ban_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Customer {
    pub fn membership(&self) -> Membership {
        if self.is_member {
            Membership::Member
        } else {
            Membership::None
        }
    }

    /// Age in whole years at `now`.
    pub fn age_at(&self, now: Timestamp) -> i32 {
        let today = now.date_naive();
        let mut age = today.years_since(self.date_of_birth).unwrap_or(0) as i32;
        if age < 0 {
            age = 0;
        }
        age
    }
}

/// Identity captured at `start`: what the kiosk scanner (or manual staff
/// entry) provides.
#[derive(Debug, Clone, Deserialize)]
pub struct CapturedIdentity {
    pub scan_hash: String,
    pub name: String,
    pub date_of_birth: NaiveDate,
}
