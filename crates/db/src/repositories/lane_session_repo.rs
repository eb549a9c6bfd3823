//! Repository for the `lane_sessions` table.
//!
//! Every mutating method re-validates the session's current state in its
//! WHERE clause and reports via `rows_affected`, so a stale caller can
//! never half-apply a command. The selection lock is a DB-enforced
//! compare-and-set: the two proposing actors live on different devices,
//! so an in-memory mutex would not serialize them.

use sqlx::{PgConnection, PgPool};

use frontdesk_core::session::{Actor, CheckinMode};
use frontdesk_core::tier::RentalType;
use frontdesk_core::types::DbId;

use crate::models::lane_session::LaneSession;

const COLUMNS: &str = "\
    id, lane_id, status, checkin_mode, customer_id, scan_hash, \
    proposed_rental_type, proposed_by, desired_rental_type, \
    selection_locked, confirmed_by, selection_acknowledged, \
    waitlist_desired_type, backup_rental_type, \
    assigned_resource_id, assigned_rental_type, \
    price_quote, disclaimer_ack, payment_intent_id, payment_status, \
    visit_id, checkin_block_id, waitlist_entry_id, \
    created_at, updated_at";

const TERMINAL: &str = "('COMPLETED', 'CANCELLED')";

pub struct LaneSessionRepo;

impl LaneSessionRepo {
    /// The lane's live (non-terminal) session, if any.
    pub async fn find_live_by_lane(
        pool: &PgPool,
        lane_id: &str,
    ) -> Result<Option<LaneSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM lane_sessions \
             WHERE lane_id = $1 AND status NOT IN {TERMINAL}"
        );
        sqlx::query_as::<_, LaneSession>(&query)
            .bind(lane_id)
            .fetch_optional(pool)
            .await
    }

    /// Live session re-read under a row lock, for multi-step commands.
    pub async fn lock_live_by_lane(
        conn: &mut PgConnection,
        lane_id: &str,
    ) -> Result<Option<LaneSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM lane_sessions \
             WHERE lane_id = $1 AND status NOT IN {TERMINAL} \
             FOR UPDATE"
        );
        sqlx::query_as::<_, LaneSession>(&query)
            .bind(lane_id)
            .fetch_optional(conn)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<LaneSession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM lane_sessions WHERE id = $1");
        sqlx::query_as::<_, LaneSession>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Most recent session for a lane, terminal or not. Used by the
    /// idempotent `sign_agreement` replay path.
    pub async fn find_latest_by_lane(
        pool: &PgPool,
        lane_id: &str,
    ) -> Result<Option<LaneSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM lane_sessions \
             WHERE lane_id = $1 ORDER BY created_at DESC LIMIT 1"
        );
        sqlx::query_as::<_, LaneSession>(&query)
            .bind(lane_id)
            .fetch_optional(pool)
            .await
    }

    /// Create a session at identity capture. The partial unique index on
    /// live lanes turns a concurrent double-start into a constraint error
    /// instead of two live sessions.
    pub async fn create(
        conn: &mut PgConnection,
        lane_id: &str,
        mode: CheckinMode,
        customer_id: DbId,
        scan_hash: &str,
        visit_id: Option<DbId>,
    ) -> Result<LaneSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO lane_sessions (lane_id, checkin_mode, customer_id, scan_hash, visit_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LaneSession>(&query)
            .bind(lane_id)
            .bind(mode.as_str())
            .bind(customer_id)
            .bind(scan_hash)
            .bind(visit_id)
            .fetch_one(conn)
            .await
    }

    /// Cancel whatever live session a lane has (replace-on-start, reset).
    pub async fn cancel_live_for_lane(
        conn: &mut PgConnection,
        lane_id: &str,
    ) -> Result<Option<LaneSession>, sqlx::Error> {
        let query = format!(
            "UPDATE lane_sessions \
             SET status = 'CANCELLED', updated_at = NOW() \
             WHERE lane_id = $1 AND status NOT IN {TERMINAL} \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LaneSession>(&query)
            .bind(lane_id)
            .fetch_optional(conn)
            .await
    }

    /// Record a non-authoritative proposal. Never locks.
    pub async fn propose(
        pool: &PgPool,
        id: DbId,
        rental_type: RentalType,
        proposed_by: Actor,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE lane_sessions \
             SET proposed_rental_type = $2, proposed_by = $3, updated_at = NOW() \
             WHERE id = $1 AND status = 'ACTIVE' AND selection_locked = FALSE",
        )
        .bind(id)
        .bind(rental_type.as_str())
        .bind(proposed_by.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// First-writer-wins confirm. The compare-and-set on
    /// `selection_locked` decides the race: exactly one concurrent caller
    /// sees a row come back; everyone else gets `None` and must map that
    /// to ALREADY_LOCKED.
    pub async fn confirm_selection(
        conn: &mut PgConnection,
        id: DbId,
        rental_type: RentalType,
        confirmed_by: Actor,
    ) -> Result<Option<LaneSession>, sqlx::Error> {
        let query = format!(
            "UPDATE lane_sessions \
             SET desired_rental_type = $2, selection_locked = TRUE, \
                 confirmed_by = $3, updated_at = NOW() \
             WHERE id = $1 AND status = 'ACTIVE' AND selection_locked = FALSE \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LaneSession>(&query)
            .bind(id)
            .bind(rental_type.as_str())
            .bind(confirmed_by.as_str())
            .fetch_optional(conn)
            .await
    }

    /// Acknowledge the locked selection and advance to assignment.
    pub async fn acknowledge(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<LaneSession>, sqlx::Error> {
        let query = format!(
            "UPDATE lane_sessions \
             SET selection_acknowledged = TRUE, status = 'AWAITING_ASSIGNMENT', \
                 updated_at = NOW() \
             WHERE id = $1 AND status = 'ACTIVE' \
               AND selection_locked = TRUE AND selection_acknowledged = FALSE \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LaneSession>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Record the fallback the customer accepted: keep what they wanted
    /// for the waitlist, check them into the backup tier.
    pub async fn set_waitlist_fallback(
        pool: &PgPool,
        id: DbId,
        desired: RentalType,
        backup: RentalType,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE lane_sessions \
             SET waitlist_desired_type = $2, backup_rental_type = $3, updated_at = NOW() \
             WHERE id = $1 AND status = 'AWAITING_ASSIGNMENT'",
        )
        .bind(id)
        .bind(desired.as_str())
        .bind(backup.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a tentative assignment. The resource is not consumed yet;
    /// only the finalize transaction flips it OCCUPIED.
    pub async fn set_tentative_assignment(
        conn: &mut PgConnection,
        id: DbId,
        resource_id: DbId,
        rental_type: RentalType,
        new_status: &str,
    ) -> Result<Option<LaneSession>, sqlx::Error> {
        let query = format!(
            "UPDATE lane_sessions \
             SET assigned_resource_id = $2, assigned_rental_type = $3, \
                 status = $4, updated_at = NOW() \
             WHERE id = $1 AND status = 'AWAITING_ASSIGNMENT' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LaneSession>(&query)
            .bind(id)
            .bind(resource_id)
            .bind(rental_type.as_str())
            .bind(new_status)
            .fetch_optional(conn)
            .await
    }

    /// Customer accepted the cross-type assignment.
    pub async fn accept_cross_type(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<LaneSession>, sqlx::Error> {
        let query = format!(
            "UPDATE lane_sessions \
             SET status = 'AWAITING_PAYMENT', updated_at = NOW() \
             WHERE id = $1 AND status = 'AWAITING_CUSTOMER' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LaneSession>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Customer declined: revert the tentative assignment and return to
    /// assignment.
    pub async fn decline_cross_type(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<LaneSession>, sqlx::Error> {
        let query = format!(
            "UPDATE lane_sessions \
             SET assigned_resource_id = NULL, assigned_rental_type = NULL, \
                 status = 'AWAITING_ASSIGNMENT', updated_at = NOW() \
             WHERE id = $1 AND status = 'AWAITING_CUSTOMER' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LaneSession>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Attach a payment intent and quote.
    pub async fn set_payment_intent(
        pool: &PgPool,
        id: DbId,
        intent_id: &str,
        quote: &serde_json::Value,
    ) -> Result<Option<LaneSession>, sqlx::Error> {
        let query = format!(
            "UPDATE lane_sessions \
             SET payment_intent_id = $2, price_quote = $3, updated_at = NOW() \
             WHERE id = $1 AND status = 'AWAITING_PAYMENT' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LaneSession>(&query)
            .bind(id)
            .bind(intent_id)
            .bind(quote)
            .fetch_optional(pool)
            .await
    }

    /// Mark the session paid and advance to the given status
    /// (AWAITING_SIGNATURE, or straight to finalize for UPGRADE mode).
    pub async fn mark_paid(
        conn: &mut PgConnection,
        id: DbId,
        new_status: &str,
    ) -> Result<Option<LaneSession>, sqlx::Error> {
        let query = format!(
            "UPDATE lane_sessions \
             SET payment_status = 'PAID', status = $2, updated_at = NOW() \
             WHERE id = $1 AND status = 'AWAITING_PAYMENT' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LaneSession>(&query)
            .bind(id)
            .bind(new_status)
            .fetch_optional(conn)
            .await
    }

    /// Complete the session inside the allocator's transaction, linking
    /// the created visit and block. The status condition keeps a
    /// concurrent duplicate finalize from double-completing.
    pub async fn complete(
        conn: &mut PgConnection,
        id: DbId,
        visit_id: DbId,
        checkin_block_id: DbId,
        disclaimer_ack: Option<&serde_json::Value>,
    ) -> Result<Option<LaneSession>, sqlx::Error> {
        let query = format!(
            "UPDATE lane_sessions \
             SET status = 'COMPLETED', visit_id = $2, checkin_block_id = $3, \
                 disclaimer_ack = COALESCE($4, disclaimer_ack), updated_at = NOW() \
             WHERE id = $1 AND status NOT IN {TERMINAL} \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LaneSession>(&query)
            .bind(id)
            .bind(visit_id)
            .bind(checkin_block_id)
            .bind(disclaimer_ack)
            .fetch_optional(conn)
            .await
    }

    /// Pre-lock the selection for an UPGRADE-mode session: the live offer
    /// already decided the tier and the unit, so the session skips the
    /// negotiation phase and lands directly in assignment.
    pub async fn prime_upgrade(
        conn: &mut PgConnection,
        id: DbId,
        tier: RentalType,
        resource_id: DbId,
        waitlist_entry_id: DbId,
    ) -> Result<Option<LaneSession>, sqlx::Error> {
        let query = format!(
            "UPDATE lane_sessions \
             SET desired_rental_type = $2, selection_locked = TRUE, \
                 confirmed_by = 'EMPLOYEE', selection_acknowledged = TRUE, \
                 assigned_resource_id = $3, assigned_rental_type = $2, \
                 waitlist_entry_id = $4, status = 'AWAITING_ASSIGNMENT', \
                 updated_at = NOW() \
             WHERE id = $1 AND status = 'ACTIVE' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LaneSession>(&query)
            .bind(id)
            .bind(tier.as_str())
            .bind(resource_id)
            .bind(waitlist_entry_id)
            .fetch_optional(conn)
            .await
    }
}
