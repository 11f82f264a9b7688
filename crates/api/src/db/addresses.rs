//! Shipping address repository.

use clearwell_core::AddressId;

use super::query::{self, Filter};
use super::{DbPools, RepositoryError};
use crate::models::ShippingAddress;

/// Fields accepted when creating a shipping address. Presence of the
/// required fields is enforced by the orchestration layer before this
/// repository is reached.
#[derive(Debug, Clone, Default)]
pub struct NewAddress {
    pub user_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub street_address: Option<String>,
    pub apt_suite: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
}

/// Repository for the `shipping_addresses` table.
pub struct AddressRepository<'a> {
    pools: &'a DbPools,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pools: &'a DbPools) -> Self {
        Self { pools }
    }

    /// Insert an address and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, address: &NewAddress) -> Result<ShippingAddress, RepositoryError> {
        let mut builder = query::insert(
            "shipping_addresses",
            &[
                "user_id",
                "first_name",
                "last_name",
                "street_address",
                "apt_suite",
                "city",
                "state",
                "zip",
                "country",
                "phone",
            ],
            vec![
                address.user_id.clone().into(),
                address.first_name.clone().into(),
                address.last_name.clone().into(),
                address.street_address.clone().into(),
                address.apt_suite.clone().into(),
                address.city.clone().into(),
                address.state.clone().into(),
                address.zip.clone().into(),
                address.country.clone().into(),
                address.phone.clone().into(),
            ],
        );

        let row = builder
            .build_query_as::<ShippingAddress>()
            .fetch_one(self.pools.write())
            .await?;
        Ok(row)
    }

    /// Address rows with the given id (zero or one, kept as a list so the
    /// attached `shipping_address` field mirrors the wire shape).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_id(
        &self,
        id: AddressId,
    ) -> Result<Vec<ShippingAddress>, RepositoryError> {
        let mut builder = query::select(
            "shipping_addresses",
            &["*"],
            vec![Filter::Eq("id", id.as_i32().into())],
            &[],
            None,
        );
        let addresses = builder
            .build_query_as::<ShippingAddress>()
            .fetch_all(self.pools.read())
            .await?;
        Ok(addresses)
    }
}
