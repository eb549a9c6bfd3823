use serde::Serialize;
use sqlx::FromRow;

use frontdesk_core::types::{DbId, Timestamp};

/// A row from the `visits` table: one continuous stay for a customer.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Visit {
    pub id: DbId,
    pub customer_id: DbId,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
