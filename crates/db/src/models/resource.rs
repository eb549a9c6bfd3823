use serde::Serialize;
use sqlx::FromRow;

use frontdesk_core::resource::{ResourceKind, ResourceStatus};
use frontdesk_core::tier::RentalType;
use frontdesk_core::types::{DbId, Timestamp};

/// A row from the `resources` table (rooms and lockers).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Resource {
    pub id: DbId,
    #[sqlx(try_from = "String")]
    pub kind: ResourceKind,
    pub number: i32,
    #[sqlx(try_from = "String")]
    pub rental_type: RentalType,
    #[sqlx(try_from = "String")]
    pub status: ResourceStatus,
    pub assigned_to_customer_id: Option<DbId>,
    pub version: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
