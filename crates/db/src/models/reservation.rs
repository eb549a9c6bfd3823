use serde::Serialize;
use sqlx::FromRow;

use frontdesk_core::types::{DbId, Timestamp};
use frontdesk_core::waitlist::ReleaseReason;

/// A row from the `inventory_reservations` table: a time-bound hold
/// binding one resource to one waitlist entry.
///
/// At most one row per resource has `released_at IS NULL` (partial
/// unique index); the allocator treats such rows as hard exclusions.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InventoryReservation {
    pub id: DbId,
    pub resource_id: DbId,
    pub kind: String,
    pub waitlist_id: DbId,
    pub expires_at: Timestamp,
    pub released_at: Option<Timestamp>,
    release_reason: Option<String>,
    pub created_at: Timestamp,
}

impl InventoryReservation {
    pub fn is_open(&self) -> bool {
        self.released_at.is_none()
    }

    pub fn release_reason(&self) -> Option<ReleaseReason> {
        self.release_reason.as_deref().and_then(|s| s.parse().ok())
    }
}
