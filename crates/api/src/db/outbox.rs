//! Reconciliation outbox.
//!
//! When a remote-side write succeeds but the local mirror write fails, the
//! drift is recorded here instead of disappearing into a log line. A
//! background repair process (out of scope) can replay these rows.

use super::{DbPools, RepositoryError};

/// Repository for the `reconciliation_outbox` table.
pub struct OutboxRepository<'a> {
    pools: &'a DbPools,
}

impl<'a> OutboxRepository<'a> {
    /// Create a new outbox repository.
    #[must_use]
    pub const fn new(pools: &'a DbPools) -> Self {
        Self { pools }
    }

    /// Record a remote-succeeded/local-failed drift entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn record(
        &self,
        aggregate: &str,
        aggregate_id: &str,
        payload: &serde_json::Value,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO reconciliation_outbox (aggregate, aggregate_id, payload)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(aggregate)
        .bind(aggregate_id)
        .bind(payload.to_string())
        .execute(self.pools.write())
        .await?;
        Ok(())
    }
}
