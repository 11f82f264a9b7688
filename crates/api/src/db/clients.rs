//! Client mirror repository.

use super::query;
use super::{DbPools, RepositoryError};
use crate::models::{Client, NewClient};

/// Repository for the `clients` mirror table.
pub struct ClientRepository<'a> {
    pools: &'a DbPools,
}

impl<'a> ClientRepository<'a> {
    /// Create a new client repository.
    #[must_use]
    pub const fn new(pools: &'a DbPools) -> Self {
        Self { pools }
    }

    /// Persist the local mirror row for a freshly created remote client.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the `client_id` already has a
    /// mirror row, `RepositoryError::Database` for other failures.
    pub async fn create(&self, client: &NewClient) -> Result<Client, RepositoryError> {
        let mut builder = query::insert(
            "clients",
            &[
                "client_id",
                "first_name",
                "last_name",
                "email",
                "phone_number",
                "user_group_id",
                "additional_record_identifier",
            ],
            vec![
                client.client_id.as_str().into(),
                client.first_name.clone().into(),
                client.last_name.clone().into(),
                client.email.as_str().into(),
                client.phone_number.clone().into(),
                client.user_group_id.clone().into(),
                client.additional_record_identifier.clone().into(),
            ],
        );

        builder
            .build_query_as::<Client>()
            .fetch_one(self.pools.write())
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return RepositoryError::Conflict("client_id already mirrored".to_owned());
                }
                RepositoryError::Database(e)
            })
    }
}
