//! User repository.

use clearwell_core::UserId;

use super::query::{self, Filter, SqlValue};
use super::{DbPools, RepositoryError};
use crate::models::User;

/// The allow-listed field set for user updates. Anything outside this
/// struct cannot be written through the repository.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub skipped_email: Option<bool>,
    pub phone_number: Option<String>,
    pub record_identifier: Option<String>,
    pub additional_record_identifier: Option<String>,
    pub height: Option<String>,
}

impl UserUpdate {
    /// Column/value pairs for the fields actually provided.
    fn assignments(self) -> Vec<(&'static str, SqlValue)> {
        let mut set = Vec::new();
        if let Some(v) = self.first_name {
            set.push(("first_name", v.into()));
        }
        if let Some(v) = self.last_name {
            set.push(("last_name", v.into()));
        }
        if let Some(v) = self.email {
            set.push(("email", v.into()));
        }
        if let Some(v) = self.skipped_email {
            set.push(("skipped_email", v.into()));
        }
        if let Some(v) = self.phone_number {
            set.push(("phone_number", v.into()));
        }
        if let Some(v) = self.record_identifier {
            set.push(("record_identifier", v.into()));
        }
        if let Some(v) = self.additional_record_identifier {
            set.push(("additional_record_identifier", v.into()));
        }
        if let Some(v) = self.height {
            set.push(("height", v.into()));
        }
        set
    }
}

/// Repository for the `users` table.
pub struct UserRepository<'a> {
    pools: &'a DbPools,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pools: &'a DbPools) -> Self {
        Self { pools }
    }

    /// Look up a user by local id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let mut builder = query::select(
            "users",
            &["*"],
            vec![Filter::Eq("id", id.as_i32().into())],
            &[],
            Some(1),
        );
        let user = builder
            .build_query_as::<User>()
            .fetch_optional(self.pools.read())
            .await?;
        Ok(user)
    }

    /// Apply an allow-listed update and return the updated row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Query` if no updatable field was provided,
    /// `RepositoryError::Database` if the statement fails.
    pub async fn update(
        &self,
        id: UserId,
        update: UserUpdate,
    ) -> Result<Option<User>, RepositoryError> {
        let mut builder = query::update(
            "users",
            update.assignments(),
            vec![Filter::Eq("id", id.as_i32().into())],
        )?;
        let user = builder
            .build_query_as::<User>()
            .fetch_optional(self.pools.write())
            .await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignments_only_include_provided_fields() {
        let update = UserUpdate {
            first_name: Some("Jane".to_owned()),
            height: Some("70".to_owned()),
            ..UserUpdate::default()
        };
        let set = update.assignments();
        let columns: Vec<&str> = set.iter().map(|(c, _)| *c).collect();
        assert_eq!(columns, vec!["first_name", "height"]);
    }

    #[test]
    fn test_empty_update_has_no_assignments() {
        assert!(UserUpdate::default().assignments().is_empty());
    }
}
