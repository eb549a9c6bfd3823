//! Repository for the `visits` table.

use sqlx::{PgConnection, PgPool};

use frontdesk_core::types::DbId;

use crate::models::visit::Visit;

const COLUMNS: &str = "id, customer_id, started_at, ended_at, created_at, updated_at";

pub struct VisitRepo;

impl VisitRepo {
    /// Open a new visit inside a caller-owned transaction (the allocator
    /// creates the visit and the block atomically with the assignment).
    pub async fn create(conn: &mut PgConnection, customer_id: DbId) -> Result<Visit, sqlx::Error> {
        let query = format!(
            "INSERT INTO visits (customer_id) VALUES ($1) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Visit>(&query)
            .bind(customer_id)
            .fetch_one(conn)
            .await
    }

    /// The customer's current open visit, if any. Renewals and upgrades
    /// attach new blocks to this visit instead of opening another.
    pub async fn find_open_by_customer(
        pool: &PgPool,
        customer_id: DbId,
    ) -> Result<Option<Visit>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM visits \
             WHERE customer_id = $1 AND ended_at IS NULL \
             ORDER BY started_at DESC LIMIT 1"
        );
        sqlx::query_as::<_, Visit>(&query)
            .bind(customer_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<Visit>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM visits WHERE id = $1");
        sqlx::query_as::<_, Visit>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }
}
