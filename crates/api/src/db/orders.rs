//! Order repository.

use rust_decimal::Decimal;

use super::query::{self, Filter};
use super::{DbPools, RepositoryError};
use crate::models::{NewOrder, Order};

/// Repository for the `orders` table.
pub struct OrderRepository<'a> {
    pools: &'a DbPools,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pools: &'a DbPools) -> Self {
        Self { pools }
    }

    /// Insert an order and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the `order_number` is taken,
    /// `RepositoryError::Database` for other failures.
    pub async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut builder = query::insert(
            "orders",
            &[
                "user_id",
                "order_number",
                "tracking_number",
                "total",
                "amount_paid",
                "shipping_address_id",
            ],
            vec![
                order.user_id.as_str().into(),
                order.order_number.as_str().into(),
                order.tracking_number.clone().into(),
                order.total.unwrap_or(Decimal::ZERO).into(),
                order.amount_paid.unwrap_or(Decimal::ZERO).into(),
                order.shipping_address_id.map(|id| id.as_i32()).into(),
            ],
        );

        builder
            .build_query_as::<Order>()
            .fetch_one(self.pools.write())
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return RepositoryError::Conflict("order_number already exists".to_owned());
                }
                RepositoryError::Database(e)
            })
    }

    /// All orders belonging to a patient.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<Order>, RepositoryError> {
        let mut builder = query::select(
            "orders",
            &["*"],
            vec![Filter::Eq("user_id", user_id.into())],
            &[],
            None,
        );
        let orders = builder
            .build_query_as::<Order>()
            .fetch_all(self.pools.read())
            .await?;
        Ok(orders)
    }
}
