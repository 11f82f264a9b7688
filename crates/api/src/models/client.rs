//! Local mirror of clients created on the remote identity platform.

use serde::Serialize;
use sqlx::FromRow;

use clearwell_core::ClientId;

/// A mirror row for a remotely created client.
///
/// Created exactly once, immediately after a successful remote
/// client-creation call; there is no deletion path.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Client {
    /// Remote-assigned identifier; primary correlation key.
    pub client_id: ClientId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub dietitian_id: Option<String>,
    pub user_group_id: Option<String>,
    pub record_identifier: Option<String>,
    pub additional_record_identifier: Option<String>,
    pub height: Option<String>,
}

/// Fields persisted when mirroring a fresh remote client.
#[derive(Debug, Clone)]
pub struct NewClient {
    pub client_id: ClientId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub phone_number: Option<String>,
    pub user_group_id: Option<String>,
    pub additional_record_identifier: Option<String>,
}
