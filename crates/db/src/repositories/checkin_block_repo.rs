//! Repository for the `checkin_blocks` table.

use sqlx::PgConnection;

use frontdesk_core::session::BlockKind;
use frontdesk_core::tier::RentalType;
use frontdesk_core::types::{DbId, Timestamp};

use crate::models::checkin_block::CheckinBlock;

const COLUMNS: &str = "\
    id, visit_id, kind, rental_type, resource_id, price_quote, \
    starts_at, ends_at, created_at, updated_at";

pub struct CheckinBlockRepo;

impl CheckinBlockRepo {
    /// Create a block inside the allocator's transaction, already linked
    /// to its resource.
    pub async fn create(
        conn: &mut PgConnection,
        visit_id: DbId,
        kind: BlockKind,
        rental_type: RentalType,
        resource_id: DbId,
        price_quote: Option<&serde_json::Value>,
        ends_at: Timestamp,
    ) -> Result<CheckinBlock, sqlx::Error> {
        let query = format!(
            "INSERT INTO checkin_blocks \
                 (visit_id, kind, rental_type, resource_id, price_quote, ends_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CheckinBlock>(&query)
            .bind(visit_id)
            .bind(kind.as_str())
            .bind(rental_type.as_str())
            .bind(resource_id)
            .bind(price_quote)
            .bind(ends_at)
            .fetch_one(conn)
            .await
    }
}
