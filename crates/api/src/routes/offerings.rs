//! Offerings, payment card and subscription route handlers.
//!
//! These endpoints take the caller's local user id, resolve the linked
//! remote client id, and fail with 404 before any remote call when the user
//! is unknown.

use axum::{
    Json,
    extract::{Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use clearwell_core::UserId;

use crate::ehr::{OfferingsQuery, PackageSelections, PaymentCard, StoreCardParams};
use crate::error::{AppError, Result};
use crate::middleware::CurrentActor;
use crate::models::User;
use crate::services::{Offering, SubscribeParams, SubscriptionReceipt};
use crate::state::AppState;

/// Query parameters for listing offerings.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListOfferingsQuery {
    pub offset: Option<i64>,
    pub should_paginate: Option<bool>,
    pub keywords: Option<String>,
}

/// Request body for storing a payment card.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StoreCardRequest {
    pub token: String,
    pub card_type_label: Option<String>,
    pub user_id: i32,
    pub is_default: Option<bool>,
}

/// Request body for subscribing to a plan.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SubscribeRequest {
    pub user_id: i32,
    pub offering_id: String,
    pub amount: Decimal,
    pub stripe_customer_detail_id: String,
    pub requested_payment_id: Option<String>,
    pub sender_id: Option<String>,
}

/// Request body for listing stored payment cards.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PaymentCardsRequest {
    pub user_id: i32,
}

/// Request body for listing package selections.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PackageSelectionsRequest {
    pub user_id: i32,
    pub offering_id: Option<String>,
    pub offset: Option<i64>,
}

/// Response listing offerings.
#[derive(Debug, Serialize)]
pub struct OfferingsResponse {
    pub offerings: Vec<Offering>,
}

/// Response carrying the stored card's detail id.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreCardResponse {
    pub stripe_customer_detail_id: String,
}

/// Response listing stored payment cards.
#[derive(Debug, Serialize)]
pub struct PaymentCardsResponse {
    pub cards: Vec<PaymentCard>,
}

/// Resolve a local user row or fail with 404.
async fn require_user(state: &AppState, user_id: i32) -> Result<User> {
    state
        .composite()
        .get_user_by_id(UserId::new(user_id))
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_owned()))
}

/// The remote client id linked to a local user, empty when unlinked (the
/// orchestration layer's required-identifier check then reports it).
fn linked_client_id(user: &User) -> String {
    user.client_id
        .clone()
        .map(clearwell_core::ClientId::into_inner)
        .unwrap_or_default()
}

/// List offerings from the remote catalog.
pub async fn list(
    CurrentActor(_actor): CurrentActor,
    State(state): State<AppState>,
    Query(query): Query<ListOfferingsQuery>,
) -> Result<Json<OfferingsResponse>> {
    let options = OfferingsQuery {
        offset: query.offset.unwrap_or(0),
        should_paginate: query.should_paginate.unwrap_or(true),
        keywords: query.keywords,
        ..OfferingsQuery::default()
    };

    let offerings = state.composite().get_offerings(&options).await?;
    Ok(Json(OfferingsResponse { offerings }))
}

/// Store a payment card for a user.
pub async fn store_card(
    CurrentActor(_actor): CurrentActor,
    State(state): State<AppState>,
    Json(body): Json<StoreCardRequest>,
) -> Result<Json<StoreCardResponse>> {
    let user = require_user(&state, body.user_id).await?;

    let stripe_customer_detail_id = state
        .composite()
        .store_card(StoreCardParams {
            token: body.token,
            card_type_label: body.card_type_label,
            user_id: linked_client_id(&user),
            is_default: body.is_default,
        })
        .await?;

    Ok(Json(StoreCardResponse {
        stripe_customer_detail_id,
    }))
}

/// Subscribe a user to a plan: charge, then invoice.
pub async fn subscribe(
    CurrentActor(_actor): CurrentActor,
    State(state): State<AppState>,
    Json(body): Json<SubscribeRequest>,
) -> Result<Json<SubscriptionReceipt>> {
    let user = require_user(&state, body.user_id).await?;

    let receipt = state
        .composite()
        .subscribe_to_plan(SubscribeParams {
            user_id: linked_client_id(&user),
            offering_id: body.offering_id,
            amount: body.amount,
            stripe_customer_detail_id: body.stripe_customer_detail_id,
            requested_payment_id: body.requested_payment_id,
            sender_id: body.sender_id,
        })
        .await?;

    Ok(Json(receipt))
}

/// List a user's stored payment cards.
pub async fn payment_cards(
    CurrentActor(_actor): CurrentActor,
    State(state): State<AppState>,
    Json(body): Json<PaymentCardsRequest>,
) -> Result<Json<PaymentCardsResponse>> {
    let user = require_user(&state, body.user_id).await?;

    let cards = state
        .composite()
        .get_payment_cards(&linked_client_id(&user))
        .await?;

    Ok(Json(PaymentCardsResponse { cards }))
}

/// List a user's package selections.
pub async fn package_selections(
    CurrentActor(_actor): CurrentActor,
    State(state): State<AppState>,
    Json(body): Json<PackageSelectionsRequest>,
) -> Result<Json<PackageSelections>> {
    let user = require_user(&state, body.user_id).await?;

    let selections = state
        .composite()
        .get_user_package_selections(
            &linked_client_id(&user),
            body.offering_id.as_deref(),
            body.offset.unwrap_or(0),
        )
        .await?;

    Ok(Json(selections))
}
