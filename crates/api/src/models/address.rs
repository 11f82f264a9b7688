//! Postal records referenced by orders.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use clearwell_core::AddressId;

/// A shipping address tied to a user. Created independently of orders;
/// order linkage happens through `orders.shipping_address_id`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ShippingAddress {
    pub id: AddressId,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub street_address: String,
    pub apt_suite: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
