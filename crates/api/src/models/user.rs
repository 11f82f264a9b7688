//! Local user rows correlating an auth identity to a remote client id.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use clearwell_core::{ClientId, UserId};

/// A local user row. Queried by id; updates are restricted to an
/// allow-listed field set.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: UserId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub skipped_email: Option<bool>,
    pub phone_number: Option<String>,
    pub record_identifier: Option<String>,
    pub additional_record_identifier: Option<String>,
    pub height: Option<String>,
    /// Join key to the remote identity platform.
    pub client_id: Option<ClientId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
