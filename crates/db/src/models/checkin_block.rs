use serde::Serialize;
use sqlx::FromRow;

use frontdesk_core::session::BlockKind;
use frontdesk_core::tier::RentalType;
use frontdesk_core::types::{DbId, Timestamp};

/// A row from the `checkin_blocks` table: a priced time window within a
/// visit, bound to at most one resource.
///
/// Invariant: `rental_type` matches the class of the resource actually
/// occupied once assigned (the allocator writes both in one transaction).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CheckinBlock {
    pub id: DbId,
    pub visit_id: DbId,
    #[sqlx(try_from = "String")]
    pub kind: BlockKind,
    #[sqlx(try_from = "String")]
    pub rental_type: RentalType,
    pub resource_id: Option<DbId>,
    pub price_quote: Option<serde_json::Value>,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
