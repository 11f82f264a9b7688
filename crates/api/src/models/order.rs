//! Local financial records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use clearwell_core::{AddressId, OrderId};

use super::ShippingAddress;

/// An order row. Created on explicit request, read by patient id, never
/// updated or deleted.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
    pub id: OrderId,
    /// Remote client id of the ordering patient.
    pub user_id: String,
    pub order_number: String,
    pub tracking_number: Option<String>,
    pub total: Decimal,
    pub amount_paid: Decimal,
    pub shipping_address_id: Option<AddressId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: String,
    pub order_number: String,
    pub tracking_number: Option<String>,
    pub total: Option<Decimal>,
    pub amount_paid: Option<Decimal>,
    pub shipping_address_id: Option<AddressId>,
}

/// An order with its shipping address rows attached inline.
///
/// Orders without a `shipping_address_id` serialize without the
/// `shipping_address` key.
#[derive(Debug, Clone, Serialize)]
pub struct PatientOrder {
    #[serde(flatten)]
    pub order: Order,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shipping_address: Vec<ShippingAddress>,
}
