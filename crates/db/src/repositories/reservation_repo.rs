//! Repository for the `inventory_reservations` ledger.

use sqlx::{PgConnection, PgExecutor};

use frontdesk_core::types::{DbId, Timestamp};
use frontdesk_core::waitlist::{ReleaseReason, RESERVATION_KIND_UPGRADE_HOLD};

use crate::models::reservation::InventoryReservation;

const COLUMNS: &str = "\
    id, resource_id, kind, waitlist_id, expires_at, released_at, \
    release_reason, created_at";

pub struct ReservationRepo;

impl ReservationRepo {
    /// Create an upgrade hold inside the sweep's transaction. The partial
    /// unique index on open reservations makes a double-hold on the same
    /// resource a constraint violation rather than a silent race.
    pub async fn create_upgrade_hold(
        conn: &mut PgConnection,
        resource_id: DbId,
        waitlist_id: DbId,
        expires_at: Timestamp,
    ) -> Result<InventoryReservation, sqlx::Error> {
        let query = format!(
            "INSERT INTO inventory_reservations (resource_id, kind, waitlist_id, expires_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, InventoryReservation>(&query)
            .bind(resource_id)
            .bind(RESERVATION_KIND_UPGRADE_HOLD)
            .bind(waitlist_id)
            .bind(expires_at)
            .fetch_one(conn)
            .await
    }

    /// Release the open reservation held for a waitlist entry, recording
    /// the audit reason. Returns `false` when no open reservation existed
    /// (already released; callers treat that as idempotent success).
    pub async fn release_for_waitlist(
        conn: &mut PgConnection,
        waitlist_id: DbId,
        reason: ReleaseReason,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE inventory_reservations \
             SET released_at = NOW(), release_reason = $2 \
             WHERE waitlist_id = $1 AND released_at IS NULL",
        )
        .bind(waitlist_id)
        .bind(reason.as_str())
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The live hold on a resource, if any. Executor-generic so the
    /// allocator can re-check inside its transaction.
    pub async fn find_open_for_resource<'e>(
        executor: impl PgExecutor<'e>,
        resource_id: DbId,
    ) -> Result<Option<InventoryReservation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM inventory_reservations \
             WHERE resource_id = $1 AND released_at IS NULL"
        );
        sqlx::query_as::<_, InventoryReservation>(&query)
            .bind(resource_id)
            .fetch_optional(executor)
            .await
    }
}
