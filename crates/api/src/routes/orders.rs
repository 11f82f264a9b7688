//! Order and shipping address route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use clearwell_core::AddressId;

use crate::db::addresses::NewAddress;
use crate::error::Result;
use crate::models::{NewOrder, Order, PatientOrder, ShippingAddress};
use crate::state::AppState;

/// Request body for creating an order.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateOrderRequest {
    pub user_id: String,
    pub order_number: String,
    pub tracking_number: Option<String>,
    pub total: Option<Decimal>,
    pub amount_paid: Option<Decimal>,
    pub shipping_address_id: Option<i32>,
}

/// Request body for creating a shipping address. Field presence is enforced
/// by the orchestration layer so the error can name the first missing field.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateAddressRequest {
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

/// Response listing a patient's orders.
#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    pub orders: Vec<PatientOrder>,
}

/// Response wrapping a created address.
#[derive(Debug, Serialize)]
pub struct NewAddressResponse {
    pub new_address: ShippingAddress,
}

/// Create an order.
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = state
        .composite()
        .create_order(NewOrder {
            user_id: body.user_id,
            order_number: body.order_number,
            tracking_number: body.tracking_number,
            total: body.total,
            amount_paid: body.amount_paid,
            shipping_address_id: body.shipping_address_id.map(AddressId::new),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// List a patient's orders with shipping addresses attached.
pub async fn list_by_patient(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<OrdersResponse>> {
    let orders = state.composite().get_orders_by_patient(&user_id).await?;
    Ok(Json(OrdersResponse { orders }))
}

/// Create a shipping address.
pub async fn create_address(
    State(state): State<AppState>,
    Json(body): Json<CreateAddressRequest>,
) -> Result<(StatusCode, Json<NewAddressResponse>)> {
    let new_address = state
        .composite()
        .create_address(NewAddress {
            user_id: body.user_id,
            first_name: body.first_name,
            last_name: body.last_name,
            street_address: body.street_address,
            apt_suite: body.apt_suite,
            city: body.city,
            state: body.state,
            zip: body.zip,
            country: body.country,
            phone: body.phone,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(NewAddressResponse { new_address })))
}
