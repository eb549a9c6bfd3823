//! Repository for the `waitlist_entries` queue.

use sqlx::{PgConnection, PgExecutor, PgPool};

use frontdesk_core::tier::RentalType;
use frontdesk_core::types::{DbId, Timestamp};

use crate::models::waitlist::WaitlistEntry;

const COLUMNS: &str = "\
    id, visit_id, checkin_block_id, desired_tier, backup_tier, status, \
    resource_id, offered_at, offer_expires_at, created_at, updated_at";

pub struct WaitlistRepo;

impl WaitlistRepo {
    /// Record unmet demand at check-in completion (fallback path), inside
    /// the allocator's transaction.
    pub async fn create(
        conn: &mut PgConnection,
        visit_id: DbId,
        checkin_block_id: DbId,
        desired_tier: RentalType,
        backup_tier: Option<RentalType>,
    ) -> Result<WaitlistEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO waitlist_entries \
                 (visit_id, checkin_block_id, desired_tier, backup_tier) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WaitlistEntry>(&query)
            .bind(visit_id)
            .bind(checkin_block_id)
            .bind(desired_tier.as_str())
            .bind(backup_tier.map(|t| t.as_str()))
            .fetch_one(conn)
            .await
    }

    /// Outstanding ACTIVE/OFFERED demand for a tier. Subtracted from the
    /// raw clean count to compute effective availability.
    pub async fn count_open_for_tier<'e>(
        executor: impl PgExecutor<'e>,
        tier: RentalType,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM waitlist_entries \
             WHERE desired_tier = $1 AND status IN ('ACTIVE', 'OFFERED')",
        )
        .bind(tier.as_str())
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    /// The live offer attached to a visit, if any. UPGRADE-mode sessions
    /// resolve their target entry through this.
    pub async fn find_offered_by_visit<'e>(
        executor: impl PgExecutor<'e>,
        visit_id: DbId,
    ) -> Result<Option<WaitlistEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM waitlist_entries \
             WHERE visit_id = $1 AND status = 'OFFERED' \
             ORDER BY offered_at DESC LIMIT 1"
        );
        sqlx::query_as::<_, WaitlistEntry>(&query)
            .bind(visit_id)
            .fetch_optional(executor)
            .await
    }

    /// Overdue offers, locked for the expire sweep. `SKIP LOCKED` keeps a
    /// second sweep instance (or a racing fulfillment) from double
    /// processing a row.
    pub async fn lock_overdue_offers(
        conn: &mut PgConnection,
        now: Timestamp,
    ) -> Result<Vec<WaitlistEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM waitlist_entries \
             WHERE status = 'OFFERED' AND offer_expires_at <= $1 \
             ORDER BY offer_expires_at ASC \
             FOR UPDATE SKIP LOCKED"
        );
        sqlx::query_as::<_, WaitlistEntry>(&query)
            .bind(now)
            .fetch_all(conn)
            .await
    }

    /// Revert a lapsed offer to ACTIVE, clearing the offer fields. The
    /// conditional WHERE makes the revert idempotent under redelivery.
    pub async fn revert_offer(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE waitlist_entries \
             SET status = 'ACTIVE', resource_id = NULL, offered_at = NULL, \
                 offer_expires_at = NULL, updated_at = NOW() \
             WHERE id = $1 AND status = 'OFFERED'",
        )
        .bind(id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Oldest ACTIVE entry for a tier, locked for the hold sweep. FIFO
    /// fairness: strictly oldest-entry-first per tier.
    pub async fn lock_oldest_active(
        conn: &mut PgConnection,
        tier: RentalType,
    ) -> Result<Option<WaitlistEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM waitlist_entries \
             WHERE desired_tier = $1 AND status = 'ACTIVE' \
             ORDER BY created_at ASC LIMIT 1 \
             FOR UPDATE SKIP LOCKED"
        );
        sqlx::query_as::<_, WaitlistEntry>(&query)
            .bind(tier.as_str())
            .fetch_optional(conn)
            .await
    }

    /// Attach a live offer to an ACTIVE entry.
    pub async fn mark_offered(
        conn: &mut PgConnection,
        id: DbId,
        resource_id: DbId,
        offer_expires_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE waitlist_entries \
             SET status = 'OFFERED', resource_id = $2, offered_at = NOW(), \
                 offer_expires_at = $3, updated_at = NOW() \
             WHERE id = $1 AND status = 'ACTIVE'",
        )
        .bind(id)
        .bind(resource_id)
        .bind(offer_expires_at)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Fulfil an OFFERED entry (the customer took the upgrade), locked
    /// within the allocator's transaction.
    pub async fn complete(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE waitlist_entries \
             SET status = 'COMPLETED', updated_at = NOW() \
             WHERE id = $1 AND status = 'OFFERED'",
        )
        .bind(id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Staff cancellation of an open entry.
    pub async fn cancel(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE waitlist_entries \
             SET status = 'CANCELLED', updated_at = NOW() \
             WHERE id = $1 AND status IN ('ACTIVE', 'OFFERED')",
        )
        .bind(id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Open entries whose underlying demand disappeared: the linked block
    /// has ended or the visit has ended. Locked for the 60s backstop
    /// sweep; the lock covers only waitlist rows.
    pub async fn lock_stale_open(
        conn: &mut PgConnection,
        now: Timestamp,
    ) -> Result<Vec<WaitlistEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM waitlist_entries w \
             WHERE w.status IN ('ACTIVE', 'OFFERED') \
               AND EXISTS (\
                   SELECT 1 FROM visits v \
                   LEFT JOIN checkin_blocks b ON b.id = w.checkin_block_id \
                   WHERE v.id = w.visit_id \
                     AND (v.ended_at IS NOT NULL OR b.ends_at <= $1)\
               ) \
             ORDER BY w.created_at ASC \
             FOR UPDATE OF w SKIP LOCKED",
            columns_prefixed("w")
        );
        sqlx::query_as::<_, WaitlistEntry>(&query)
            .bind(now)
            .fetch_all(conn)
            .await
    }

    /// Expire an open entry whose demand is gone.
    pub async fn expire(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE waitlist_entries \
             SET status = 'EXPIRED', resource_id = NULL, offered_at = NULL, \
                 offer_expires_at = NULL, updated_at = NOW() \
             WHERE id = $1 AND status IN ('ACTIVE', 'OFFERED')",
        )
        .bind(id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Open entries, oldest first, for the staff dashboard.
    pub async fn list_open(pool: &PgPool) -> Result<Vec<WaitlistEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM waitlist_entries \
             WHERE status IN ('ACTIVE', 'OFFERED') \
             ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, WaitlistEntry>(&query).fetch_all(pool).await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<WaitlistEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM waitlist_entries WHERE id = $1");
        sqlx::query_as::<_, WaitlistEntry>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lock an entry row for the allocator (offer fulfillment re-check).
    pub async fn lock_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<WaitlistEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM waitlist_entries WHERE id = $1 FOR UPDATE"
        );
        sqlx::query_as::<_, WaitlistEntry>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }
}

/// `COLUMNS` with a table alias prefix, for joined queries.
fn columns_prefixed(alias: &str) -> String {
    COLUMNS
        .split(", ")
        .map(|c| format!("{alias}.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}
