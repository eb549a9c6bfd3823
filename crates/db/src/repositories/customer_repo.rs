//! Repository for the `customers` table.

use sqlx::PgPool;

use frontdesk_core::types::DbId;

use crate::models::customer::{CapturedIdentity, Customer};

/// Column list for `customers` queries.
const COLUMNS: &str = "\
    id, name, date_of_birth, scan_hash, is_member, is_banned, ban_reason, \
    created_at, updated_at";

pub struct CustomerRepo;

impl CustomerRepo {
    /// Resolve a scanned identity to a customer row, creating one on
    /// first sight. Idempotent per scan hash: rescanning the same
    /// document returns the same row (name and birth date refresh from
    /// the latest scan).
    pub async fn upsert_by_scan(
        pool: &PgPool,
        identity: &CapturedIdentity,
    ) -> Result<Customer, sqlx::Error> {
        let query = format!(
            "INSERT INTO customers (name, date_of_birth, scan_hash) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (scan_hash) DO UPDATE \
                 SET name = EXCLUDED.name, \
                     date_of_birth = EXCLUDED.date_of_birth, \
                     updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Customer>(&query)
            .bind(&identity.name)
            .bind(identity.date_of_birth)
            .bind(&identity.scan_hash)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Customer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM customers WHERE id = $1");
        sqlx::query_as::<_, Customer>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
