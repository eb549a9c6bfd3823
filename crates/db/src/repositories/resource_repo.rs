//! Repository for the `resources` table (rooms and lockers).
//!
//! Candidate eligibility is always computed the same way: status CLEAN,
//! unassigned, no open inventory reservation targeting the row, and no
//! live lane session tentatively assigned to it. The allocator re-checks
//! under a row lock before flipping to OCCUPIED.

use sqlx::{PgConnection, PgPool};

use frontdesk_core::tier::RentalType;
use frontdesk_core::types::DbId;

use crate::models::resource::Resource;

const COLUMNS: &str = "\
    id, kind, number, rental_type, status, assigned_to_customer_id, \
    version, created_at, updated_at";

/// Shared predicate: clean, unassigned, not held by a live reservation,
/// and not tentatively assigned to a live lane session. The last clause
/// keeps the hold sweep and a second walk-in off a unit someone is
/// mid-payment on.
const ELIGIBLE: &str = "\
    r.status = 'CLEAN' AND r.assigned_to_customer_id IS NULL \
    AND NOT EXISTS (\
        SELECT 1 FROM inventory_reservations ir \
        WHERE ir.resource_id = r.id AND ir.released_at IS NULL\
    ) \
    AND NOT EXISTS (\
        SELECT 1 FROM lane_sessions ls \
        WHERE ls.assigned_resource_id = r.id \
          AND ls.status NOT IN ('COMPLETED', 'CANCELLED')\
    )";

pub struct ResourceRepo;

impl ResourceRepo {
    /// Raw clean count for a tier. Reservation-held units are still CLEAN
    /// and count here: each live hold pairs 1:1 with an OFFERED waitlist
    /// entry, and effective availability subtracts that demand instead.
    /// Excluding held units too would double-count every live offer.
    pub async fn count_clean<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        tier: RentalType,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM resources r \
             WHERE r.rental_type = $1 AND r.status = 'CLEAN' \
               AND r.assigned_to_customer_id IS NULL",
        )
        .bind(tier.as_str())
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    /// Lowest-numbered eligible unit of a tier. Unlocked read: the
    /// allocator re-validates under `FOR UPDATE` before committing.
    pub async fn pick_candidate(
        pool: &PgPool,
        tier: RentalType,
    ) -> Result<Option<Resource>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM resources r \
             WHERE r.rental_type = $1 AND {ELIGIBLE} \
             ORDER BY r.number ASC LIMIT 1"
        );
        sqlx::query_as::<_, Resource>(&query)
            .bind(tier.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Lowest-numbered eligible unit, locked for the upgrade-hold sweep.
    /// `SKIP LOCKED` keeps concurrent sweeps (or a racing allocator) from
    /// blocking on each other.
    pub async fn pick_candidate_for_hold(
        conn: &mut PgConnection,
        tier: RentalType,
    ) -> Result<Option<Resource>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM resources r \
             WHERE r.rental_type = $1 AND {ELIGIBLE} \
             ORDER BY r.number ASC LIMIT 1 \
             FOR UPDATE SKIP LOCKED"
        );
        sqlx::query_as::<_, Resource>(&query)
            .bind(tier.as_str())
            .fetch_optional(conn)
            .await
    }

    /// Re-read a resource row under a row lock. This serializes every
    /// concurrent attempt to consume the same unit.
    pub async fn lock_for_assignment(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Resource>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM resources r WHERE r.id = $1 FOR UPDATE");
        sqlx::query_as::<_, Resource>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Flip a locked, verified-eligible row to OCCUPIED. The conditional
    /// WHERE is a belt against callers that skipped the re-check; a
    /// `false` return means the row was not consumable.
    pub async fn occupy(
        conn: &mut PgConnection,
        id: DbId,
        customer_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE resources \
             SET status = 'OCCUPIED', assigned_to_customer_id = $2, \
                 version = version + 1, updated_at = NOW() \
             WHERE id = $1 AND status = 'CLEAN' AND assigned_to_customer_id IS NULL",
        )
        .bind(id)
        .bind(customer_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Vacate a resource (checkout or upgrade move-out). The unit goes
    /// DIRTY and re-enters the cleaning cycle.
    pub async fn vacate(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE resources \
             SET status = 'DIRTY', assigned_to_customer_id = NULL, \
                 version = version + 1, updated_at = NOW() \
             WHERE id = $1 AND status = 'OCCUPIED'",
        )
        .bind(id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Resource>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM resources r WHERE r.id = $1");
        sqlx::query_as::<_, Resource>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The unit a customer currently occupies, excluding one id. Used by
    /// the allocator to move a customer out of their old unit on upgrade.
    pub async fn find_occupied_by_customer(
        conn: &mut PgConnection,
        customer_id: DbId,
        exclude_id: DbId,
    ) -> Result<Option<Resource>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM resources r \
             WHERE r.assigned_to_customer_id = $1 AND r.status = 'OCCUPIED' \
               AND r.id <> $2 \
             LIMIT 1"
        );
        sqlx::query_as::<_, Resource>(&query)
            .bind(customer_id)
            .bind(exclude_id)
            .fetch_optional(conn)
            .await
    }
}
