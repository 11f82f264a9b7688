//! The orchestration layer.
//!
//! Composes the remote identity/EHR client, the forms-intake client and the
//! local repositories into business operations. The remote systems are not
//! transactional with the local store or with each other: sequencing and
//! partial-failure behavior here are deliberate and documented per
//! operation. Nothing retries; the first failure surfaces to the caller.

use std::time::Duration;

use chrono::Utc;
use moka::future::Cache;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::instrument;
use uuid::Uuid;

use clearwell_core::{ClientId, UserId};

use crate::db::addresses::NewAddress;
use crate::db::users::UserUpdate;
use crate::db::{
    AddressRepository, ClientRepository, DbPools, OrderRepository, OutboxRepository,
    UserRepository,
};
use crate::ehr::{
    ChargeParams, ClientPayload, CreateClientParams, CreateEntryParams, EhrClient, EhrError,
    EntryPayload, OfferingsQuery, PackageSelections, PaymentCard, RequestedPayment,
    StoreCardParams, UpdateClientParams, UserGroup,
};
use crate::error::{AppError, Result};
use crate::intake::IntakeClient;
use crate::models::{Client, NewClient, NewOrder, Order, PatientOrder, ShippingAddress, User};
use crate::services::eligibility;

/// Shipping address fields that must be present, checked in this order; the
/// first missing one is named in the error, before any database call.
const REQUIRED_ADDRESS_FIELDS: &[&str] = &[
    "user_id",
    "first_name",
    "last_name",
    "street_address",
    "city",
    "state",
    "phone",
    "zip",
    "country",
];

/// An offering normalized to a stable field-name shape, decoupled from the
/// remote schema's naming.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offering {
    pub id: String,
    pub name: Option<String>,
    pub billing_frequency: Option<String>,
    pub currency: Option<String>,
    pub price: Option<String>,
    pub initial_payment_amount: Option<String>,
    pub initial_price_with_taxes: Option<String>,
}

/// Parameters for subscribing a patient to a plan.
#[derive(Debug, Clone)]
pub struct SubscribeParams {
    /// Remote client id of the subscriber.
    pub user_id: String,
    pub offering_id: String,
    pub amount: Decimal,
    pub stripe_customer_detail_id: String,
    pub requested_payment_id: Option<String>,
    pub sender_id: Option<String>,
}

/// Outcome of a subscription: the charge and the invoice recording it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionReceipt {
    pub billing_item_id: String,
    pub invoice: RequestedPayment,
}

/// Composes remote calls and local persistence into business operations.
#[derive(Clone)]
pub struct CompositeService {
    pools: DbPools,
    ehr: EhrClient,
    intake: IntakeClient,
    /// Hook point for catalog caching; `None` leaves it disabled.
    offerings_cache: Option<Cache<String, Vec<Offering>>>,
}

impl CompositeService {
    /// Wire the orchestration layer together.
    #[must_use]
    pub fn new(
        pools: DbPools,
        ehr: EhrClient,
        intake: IntakeClient,
        offerings_cache_ttl: Option<Duration>,
    ) -> Self {
        let offerings_cache = offerings_cache_ttl.map(|ttl| {
            Cache::builder().max_capacity(100).time_to_live(ttl).build()
        });

        Self {
            pools,
            ehr,
            intake,
            offerings_cache,
        }
    }

    // ==================== clients ====================

    /// Create a client remotely, then mirror it locally.
    ///
    /// The mirror write is not allowed to fail the operation: the remote
    /// record is never retracted, so a local failure is logged, recorded in
    /// the reconciliation outbox, and the remote creation result is returned
    /// regardless.
    #[instrument(skip(self, params, platform_user), fields(email = %params.email))]
    pub async fn create_client(
        &self,
        params: CreateClientParams,
        platform_user: Option<&str>,
    ) -> Result<ClientPayload> {
        tracing::debug!(?platform_user, "creating client");
        let payload = self.ehr.create_client(&params).await?;
        let remote_id = payload
            .user
            .as_ref()
            .map(|user| user.id.clone())
            .ok_or(EhrError::MissingData)?;

        let mirror = NewClient {
            client_id: ClientId::new(remote_id.clone()),
            first_name: params.first_name,
            last_name: params.last_name,
            email: params.email.into_inner(),
            phone_number: params.phone_number,
            user_group_id: params.user_group_id,
            additional_record_identifier: params.additional_record_identifier,
        };

        if let Err(e) = self.mirror_client(&mirror).await {
            tracing::error!(
                error = %e,
                client_id = %remote_id,
                "remote client created but local mirror failed"
            );
        }

        Ok(payload)
    }

    /// Write the mirror row; on failure, best-effort record the drift so a
    /// background process can repair it.
    async fn mirror_client(&self, mirror: &NewClient) -> Result<Client> {
        match ClientRepository::new(&self.pools).create(mirror).await {
            Ok(row) => Ok(row),
            Err(e) => {
                let drift = json!({
                    "client_id": mirror.client_id,
                    "email": mirror.email,
                    "first_name": mirror.first_name,
                    "last_name": mirror.last_name,
                });
                if let Err(outbox_err) = OutboxRepository::new(&self.pools)
                    .record("client", mirror.client_id.as_str(), &drift)
                    .await
                {
                    tracing::error!(
                        error = %outbox_err,
                        client_id = %mirror.client_id,
                        "failed to record reconciliation outbox entry"
                    );
                }
                Err(e.into())
            }
        }
    }

    /// Update the local row first, then push the same changes to the remote
    /// platform. A remote failure propagates after the local write has
    /// committed; there is no compensation.
    #[instrument(skip(self, local, remote), fields(user_id = %id, client_id = %client_id))]
    pub async fn update_client(
        &self,
        id: UserId,
        client_id: &str,
        local: UserUpdate,
        remote: UpdateClientParams,
    ) -> Result<User> {
        let updated = UserRepository::new(&self.pools)
            .update(id, local)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_owned()))?;

        self.ehr.update_client(client_id, &remote).await?;

        Ok(updated)
    }

    /// Fetch patient groupings from the remote platform.
    pub async fn retrieve_user_groups(&self, offset: i64) -> Result<Vec<UserGroup>> {
        Ok(self.ehr.user_groups(offset).await?)
    }

    // ==================== forms ====================

    /// Submit intake form answers.
    pub async fn upload_form_answers(&self, answers: &Map<String, Value>) -> Result<Value> {
        Ok(self.intake.upload_form_answers(answers).await?)
    }

    // ==================== offerings ====================

    /// Fetch the catalog, normalized to stable field names.
    #[instrument(skip(self, options))]
    pub async fn get_offerings(&self, options: &OfferingsQuery) -> Result<Vec<Offering>> {
        let cache_key = format!(
            "{}:{}:{}",
            options.offset,
            options.should_paginate,
            options.keywords.as_deref().unwrap_or_default()
        );
        if let Some(cache) = &self.offerings_cache {
            if let Some(hit) = cache.get(&cache_key).await {
                return Ok(hit);
            }
        }

        let offerings: Vec<Offering> = self
            .ehr
            .offerings(options)
            .await?
            .into_iter()
            .map(|remote| Offering {
                id: remote.id,
                name: remote.name,
                billing_frequency: remote.billing_frequency,
                currency: remote.currency,
                price: remote.price,
                initial_payment_amount: remote.initial_payment_amount,
                initial_price_with_taxes: remote.initial_price_with_taxes,
            })
            .collect();

        if let Some(cache) = &self.offerings_cache {
            cache.insert(cache_key, offerings.clone()).await;
        }

        Ok(offerings)
    }

    /// Store a payment card; returns the stripe customer detail id.
    pub async fn store_card(&self, params: StoreCardParams) -> Result<String> {
        if params.user_id.is_empty() || params.token.is_empty() {
            return Err(AppError::Validation(
                "user_id and token are required".to_owned(),
            ));
        }
        Ok(self.ehr.store_card(&params).await?)
    }

    /// Fetch the stored payment cards for a client.
    pub async fn get_payment_cards(&self, user_id: &str) -> Result<Vec<PaymentCard>> {
        if user_id.is_empty() {
            return Err(AppError::Validation("user_id is required".to_owned()));
        }
        Ok(self.ehr.payment_cards(user_id).await?)
    }

    /// Charge a patient and record an invoice for the subscription.
    ///
    /// A fresh idempotency token is generated per invocation and passed to
    /// the billing-item creation, so a retried call with the same token is
    /// safe on the remote side. The two remote calls are not atomic: if the
    /// charge succeeds and invoicing fails, the charge is not reversed and
    /// the caller sees the failure.
    #[instrument(skip(self, params), fields(client_id = %params.user_id))]
    pub async fn subscribe_to_plan(&self, params: SubscribeParams) -> Result<SubscriptionReceipt> {
        if params.user_id.is_empty()
            || params.offering_id.is_empty()
            || params.stripe_customer_detail_id.is_empty()
            || params.amount.is_zero()
        {
            return Err(AppError::Validation("Missing required parameters".to_owned()));
        }

        let idempotency_key = new_idempotency_key();
        let amount = params.amount.to_string();

        let billing_item_id = self
            .ehr
            .charge_patient(&ChargeParams {
                amount_paid: amount.clone(),
                sender_id: params
                    .sender_id
                    .unwrap_or_else(|| params.user_id.clone()),
                requested_payment_id: params.requested_payment_id,
                stripe_idempotency_key: idempotency_key,
                stripe_customer_detail_id: params.stripe_customer_detail_id,
                offering_id: params.offering_id.clone(),
                should_charge: true,
            })
            .await?;

        let invoice = self
            .ehr
            .create_invoice(&params.user_id, &params.offering_id, &amount, "offering")
            .await?;

        Ok(SubscriptionReceipt {
            billing_item_id,
            invoice,
        })
    }

    /// Fetch a client's package selections with their total count.
    pub async fn get_user_package_selections(
        &self,
        user_id: &str,
        offering_id: Option<&str>,
        offset: i64,
    ) -> Result<PackageSelections> {
        if user_id.is_empty() {
            return Err(AppError::Validation("user_id is required".to_owned()));
        }
        Ok(self
            .ehr
            .package_selections(user_id, offering_id, offset)
            .await?)
    }

    // ==================== orders ====================

    /// All orders for a patient, each address-bearing order with its
    /// shipping address rows attached inline. One address query per order by
    /// design; per-user order volumes stay small.
    #[instrument(skip(self))]
    pub async fn get_orders_by_patient(&self, user_id: &str) -> Result<Vec<PatientOrder>> {
        if user_id.is_empty() {
            return Err(AppError::Validation("Patient ID is required".to_owned()));
        }

        let orders = OrderRepository::new(&self.pools).list_by_user(user_id).await?;
        let addresses = AddressRepository::new(&self.pools);

        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let shipping_address = match order.shipping_address_id {
                Some(address_id) => addresses.list_by_id(address_id).await?,
                None => Vec::new(),
            };
            result.push(PatientOrder {
                order,
                shipping_address,
            });
        }
        Ok(result)
    }

    /// Insert an order.
    pub async fn create_order(&self, order: NewOrder) -> Result<Order> {
        if order.user_id.is_empty() {
            return Err(AppError::Validation(
                "Patient ID and order data are required".to_owned(),
            ));
        }
        Ok(OrderRepository::new(&self.pools).create(&order).await?)
    }

    /// Validate and insert a shipping address. The fixed required-field set
    /// is checked before any database call; the first missing field is named
    /// in the error.
    pub async fn create_address(&self, address: NewAddress) -> Result<ShippingAddress> {
        validate_address(&address)?;
        Ok(AddressRepository::new(&self.pools).create(&address).await?)
    }

    // ==================== users ====================

    /// Look up a local user row by id.
    pub async fn get_user_by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(UserRepository::new(&self.pools).get_by_id(id).await?)
    }

    /// Record a patient metric entry on the remote platform.
    pub async fn create_entry(&self, params: CreateEntryParams) -> Result<EntryPayload> {
        Ok(self.ehr.create_entry(&params).await?)
    }

    /// Fetch the remote user record and evaluate age and BMI gating.
    /// Returns the boolean outcome only.
    #[instrument(skip(self))]
    pub async fn check_eligibility(&self, client_id: &str) -> Result<bool> {
        let user = self
            .ehr
            .get_user(client_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_owned()))?;

        Ok(eligibility::evaluate(
            user.dob.as_deref(),
            user.height,
            user.weight.as_deref(),
            Utc::now().date_naive(),
        ))
    }

    // ==================== flows ====================

    /// The composite onboarding happy path: create the client remotely and
    /// locally, stamp the remote id onto the answers as `patient_id`, then
    /// submit them to the intake platform. The first failure aborts; a
    /// client created before a failed submission is not retracted.
    #[instrument(skip_all, fields(email = %params.email))]
    pub async fn complete_questionnaire(
        &self,
        params: CreateClientParams,
        mut answers: Map<String, Value>,
        platform_user: Option<&str>,
    ) -> Result<Value> {
        let client = self.create_client(params, platform_user).await?;
        let remote_id = client
            .user
            .map(|user| user.id)
            .ok_or(EhrError::MissingData)?;

        answers.insert("patient_id".to_owned(), json!(remote_id));

        self.upload_form_answers(&answers).await
    }
}

/// Generate a fresh idempotency token; never reused across invocations.
fn new_idempotency_key() -> String {
    Uuid::new_v4().to_string()
}

/// Check the fixed required-field set, naming the first missing field.
fn validate_address(address: &NewAddress) -> Result<()> {
    let field_value = |field: &str| -> Option<&String> {
        match field {
            "user_id" => address.user_id.as_ref(),
            "first_name" => address.first_name.as_ref(),
            "last_name" => address.last_name.as_ref(),
            "street_address" => address.street_address.as_ref(),
            "city" => address.city.as_ref(),
            "state" => address.state.as_ref(),
            "phone" => address.phone.as_ref(),
            "zip" => address.zip.as_ref(),
            "country" => address.country.as_ref(),
            _ => None,
        }
    };

    for field in REQUIRED_ADDRESS_FIELDS {
        let present = field_value(field).is_some_and(|value| !value.is_empty());
        if !present {
            return Err(AppError::Validation(format!("{field} is required")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_address() -> NewAddress {
        NewAddress {
            user_id: Some("u1".to_owned()),
            first_name: Some("Jane".to_owned()),
            last_name: Some("Doe".to_owned()),
            street_address: Some("1 Main St".to_owned()),
            apt_suite: None,
            city: Some("Austin".to_owned()),
            state: Some("TX".to_owned()),
            zip: Some("78701".to_owned()),
            country: Some("US".to_owned()),
            phone: Some("5550100".to_owned()),
        }
    }

    #[test]
    fn test_validate_address_accepts_complete_payload() {
        assert!(validate_address(&full_address()).is_ok());
    }

    #[test]
    fn test_validate_address_names_missing_zip() {
        let address = NewAddress {
            zip: None,
            ..full_address()
        };
        let err = validate_address(&address).expect_err("zip missing");
        assert_eq!(err.to_string(), "zip is required");
    }

    #[test]
    fn test_validate_address_treats_empty_string_as_missing() {
        let address = NewAddress {
            state: Some(String::new()),
            ..full_address()
        };
        let err = validate_address(&address).expect_err("state empty");
        assert_eq!(err.to_string(), "state is required");
    }

    #[test]
    fn test_validate_address_reports_first_missing_field() {
        let address = NewAddress {
            first_name: None,
            zip: None,
            ..full_address()
        };
        let err = validate_address(&address).expect_err("two missing");
        assert_eq!(err.to_string(), "first_name is required");
    }

    #[test]
    fn test_apt_suite_is_optional() {
        let address = NewAddress {
            apt_suite: None,
            ..full_address()
        };
        assert!(validate_address(&address).is_ok());
    }

    #[test]
    fn test_idempotency_keys_are_never_reused() {
        let first = new_idempotency_key();
        let second = new_idempotency_key();
        assert_ne!(first, second);
        assert_eq!(first.len(), 36);
    }
}
