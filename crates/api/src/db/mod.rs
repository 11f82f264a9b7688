//! Database access for the local identifier cache.
//!
//! The local store is a thin mirror of identifiers handed out by the remote
//! identity platform; the remote systems stay the source of truth.
//!
//! ## Tables
//!
//! - `clients` - mirror rows keyed by the remote-assigned `client_id`
//! - `orders` - local financial records (unique `order_number`)
//! - `shipping_addresses` - postal records referenced by orders
//! - `users` - correlates an auth identity to a `client_id`
//! - `reconciliation_outbox` - remote-succeeded/local-failed drift records
//! - auxiliary tables (`eligibility_criteria`, `medications`, `programs`,
//!   `program_forms`, `treatment_form_mapping`, `visits`) are defined by the
//!   migrations but not exercised by the core logic
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p clearwell-cli -- migrate
//! ```

pub mod addresses;
pub mod clients;
pub mod orders;
pub mod outbox;
pub mod query;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use clients::ClientRepository;
pub use orders::OrderRepository;
pub use outbox::OutboxRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Constraint violation (e.g., duplicate order number).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A generated statement was invalid (e.g., an update with no fields).
    #[error("invalid query: {0}")]
    Query(#[from] query::BuildError),
}

/// The two long-lived connection pools, lazily created at startup and shared
/// across requests: reads go to the read-only pool, writes to the read-write
/// pool. With no replica configured both point at the primary.
#[derive(Clone)]
pub struct DbPools {
    read: PgPool,
    write: PgPool,
}

impl DbPools {
    /// Bundle the two pools.
    #[must_use]
    pub fn new(read: PgPool, write: PgPool) -> Self {
        Self { read, write }
    }

    /// Pool for read-only statements.
    #[must_use]
    pub const fn read(&self) -> &PgPool {
        &self.read
    }

    /// Pool for mutating statements.
    #[must_use]
    pub const fn write(&self) -> &PgPool {
        &self.write
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
