use serde::Serialize;
use sqlx::FromRow;

use frontdesk_core::tier::RentalType;
use frontdesk_core::types::{DbId, Timestamp};
use frontdesk_core::waitlist::WaitlistStatus;

/// A row from the `waitlist_entries` table: demand for a tier that was
/// not satisfiable at check-in time.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WaitlistEntry {
    pub id: DbId,
    pub visit_id: DbId,
    pub checkin_block_id: DbId,
    #[sqlx(try_from = "String")]
    pub desired_tier: RentalType,
    backup_tier: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: WaitlistStatus,
    /// Set while an offer is live (`status = OFFERED`).
    pub resource_id: Option<DbId>,
    pub offered_at: Option<Timestamp>,
    pub offer_expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl WaitlistEntry {
    pub fn backup_tier(&self) -> Option<RentalType> {
        self.backup_tier.as_deref().and_then(|s| s.parse().ok())
    }
}
