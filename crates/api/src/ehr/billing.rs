//! Billing operations against the identity/EHR platform: offerings, stored
//! cards, billing items (charges), invoices and package selections.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use super::{EhrClient, EhrError, FieldMessage};

const OFFERINGS_QUERY: &str = r"
    query getOfferings(
        $offset: Int,
        $should_paginate: Boolean,
        $keywords: String,
        $sort_by: String,
        $provider_id: ID,
        $offering_id: ID,
        $offering_user_group_id: ID,
        $status: String,
        $only_client_visible: Boolean
    ) {
        offerings(
            offset: $offset,
            should_paginate: $should_paginate,
            keywords: $keywords,
            sort_by: $sort_by,
            provider_id: $provider_id,
            offering_id: $offering_id,
            offering_user_group_id: $offering_user_group_id,
            status: $status,
            only_client_visible: $only_client_visible
        ) {
            id
            name
            billing_frequency
            currency
            price
            initial_payment_amount
            initial_price_with_taxes
        }
    }
";

const STORE_CARD_MUTATION: &str = r"
    mutation createStripeCustomerDetail(
        $token: String,
        $card_type_label: String,
        $user_id: ID,
        $is_default: Boolean
    ) {
        createStripeCustomerDetail(
            input: {
                token: $token,
                card_type_label: $card_type_label,
                user_id: $user_id,
                is_default: $is_default
            }
        ) {
            stripe_customer_detail {
                id
            }
            messages {
                field
                message
            }
        }
    }
";

const CREATE_BILLING_ITEM_MUTATION: &str = r"
    mutation createBillingItem(
        $amount_paid: String,
        $sender_id: ID,
        $requested_payment_id: ID,
        $stripe_idempotency_key: String,
        $stripe_customer_detail_id: ID,
        $offering_id: ID,
        $should_charge: Boolean
    ) {
        createBillingItem(input: {
            amount_paid: $amount_paid,
            sender_id: $sender_id,
            requested_payment_id: $requested_payment_id,
            stripe_idempotency_key: $stripe_idempotency_key,
            stripe_customer_detail_id: $stripe_customer_detail_id,
            offering_id: $offering_id,
            should_charge: $should_charge
        }) {
            billingItem {
                id
            }
            messages {
                field
                message
            }
        }
    }
";

const CREATE_INVOICE_MUTATION: &str = r"
    mutation createRequestedPayment(
        $recipient_id: ID,
        $offering_id: ID,
        $price: String,
        $invoice_type: String
    ) {
        createRequestedPayment(input: {
            recipient_id: $recipient_id,
            offering_id: $offering_id,
            price: $price,
            invoice_type: $invoice_type
        }) {
            requestedPayment {
                id
            }
            messages {
                field
                message
            }
        }
    }
";

const PAYMENT_CARDS_QUERY: &str = r"
    query getStripeCustomerDetails($user_id: ID!) {
        stripeCustomerDetails(user_id: $user_id) {
            id
            last4
            exp_month
            exp_year
            brand
            is_default
        }
    }
";

const PACKAGE_SELECTIONS_QUERY: &str = r"
    query getUserPackageSelections(
        $offering_id: ID,
        $user_id: ID!,
        $offset: Int
    ) {
        userPackageSelectionsCount(
            offering_id: $offering_id,
            user_id: $user_id
        )
        userPackageSelections(
            offering_id: $offering_id,
            user_id: $user_id,
            offset: $offset
        ) {
            id
            status
            offering {
                id
                name
                description
                price
                billing_frequency
            }
            created_at
            updated_at
        }
    }
";

/// Catalog query options, passed through to the remote platform.
#[derive(Debug, Clone, Default)]
pub struct OfferingsQuery {
    pub offset: i64,
    pub should_paginate: bool,
    pub keywords: Option<String>,
    pub sort_by: Option<String>,
    pub provider_id: Option<String>,
    pub offering_id: Option<String>,
    pub offering_user_group_id: Option<String>,
    pub status: Option<String>,
    pub only_client_visible: Option<bool>,
}

/// An offering as the remote platform reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteOffering {
    pub id: String,
    pub name: Option<String>,
    pub billing_frequency: Option<String>,
    pub currency: Option<String>,
    pub price: Option<String>,
    pub initial_payment_amount: Option<String>,
    pub initial_price_with_taxes: Option<String>,
}

/// Parameters for storing a payment card.
#[derive(Debug, Clone)]
pub struct StoreCardParams {
    pub token: String,
    pub card_type_label: Option<String>,
    /// Remote client id of the cardholder.
    pub user_id: String,
    pub is_default: Option<bool>,
}

/// Parameters for charging a patient via a billing item.
#[derive(Debug, Clone)]
pub struct ChargeParams {
    pub amount_paid: String,
    pub sender_id: String,
    pub requested_payment_id: Option<String>,
    pub stripe_idempotency_key: String,
    pub stripe_customer_detail_id: String,
    pub offering_id: String,
    pub should_charge: bool,
}

/// A stored payment card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCard {
    pub id: String,
    pub last4: Option<String>,
    pub exp_month: Option<i64>,
    pub exp_year: Option<i64>,
    pub brand: Option<String>,
    pub is_default: Option<bool>,
}

/// A user's package selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSelection {
    pub id: String,
    pub status: Option<String>,
    pub offering: Option<SelectionOffering>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Offering summary nested in a package selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionOffering {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub billing_frequency: Option<String>,
}

/// Package selections with their total count.
#[derive(Debug, Clone, Serialize)]
pub struct PackageSelections {
    pub count: i64,
    pub selections: Vec<PackageSelection>,
}

#[derive(Deserialize)]
struct OfferingsData {
    offerings: Option<Vec<RemoteOffering>>,
}

#[derive(Deserialize)]
struct StripeCustomerDetail {
    id: String,
}

#[derive(Deserialize)]
struct StoreCardPayload {
    stripe_customer_detail: Option<StripeCustomerDetail>,
    #[allow(dead_code)]
    messages: Option<Vec<FieldMessage>>,
}

#[derive(Deserialize)]
struct StoreCardData {
    #[serde(rename = "createStripeCustomerDetail")]
    create_stripe_customer_detail: StoreCardPayload,
}

#[derive(Deserialize)]
struct BillingItem {
    id: String,
}

#[derive(Deserialize)]
struct BillingItemPayload {
    #[serde(rename = "billingItem")]
    billing_item: Option<BillingItem>,
}

#[derive(Deserialize)]
struct BillingItemData {
    #[serde(rename = "createBillingItem")]
    create_billing_item: BillingItemPayload,
}

/// An invoice record on the remote platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestedPayment {
    pub id: String,
}

#[derive(Deserialize)]
struct RequestedPaymentPayload {
    #[serde(rename = "requestedPayment")]
    requested_payment: Option<RequestedPayment>,
}

#[derive(Deserialize)]
struct RequestedPaymentData {
    #[serde(rename = "createRequestedPayment")]
    create_requested_payment: RequestedPaymentPayload,
}

#[derive(Deserialize)]
struct PaymentCardsData {
    #[serde(rename = "stripeCustomerDetails")]
    stripe_customer_details: Vec<PaymentCard>,
}

#[derive(Deserialize)]
struct PackageSelectionsData {
    #[serde(rename = "userPackageSelectionsCount")]
    count: i64,
    #[serde(rename = "userPackageSelections")]
    selections: Vec<PackageSelection>,
}

impl EhrClient {
    /// Fetch offerings from the remote catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or no offerings come back.
    #[instrument(skip(self, options))]
    pub async fn offerings(
        &self,
        options: &OfferingsQuery,
    ) -> Result<Vec<RemoteOffering>, EhrError> {
        let variables = json!({
            "offset": options.offset,
            "should_paginate": options.should_paginate,
            "keywords": options.keywords,
            "sort_by": options.sort_by,
            "provider_id": options.provider_id,
            "offering_id": options.offering_id,
            "offering_user_group_id": options.offering_user_group_id,
            "status": options.status,
            "only_client_visible": options.only_client_visible,
        });

        let data: OfferingsData = self.execute(OFFERINGS_QUERY, variables).await?;
        data.offerings.ok_or(EhrError::MissingData)
    }

    /// Store a payment card and return the stripe customer detail id.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the payload carries no
    /// detail record.
    #[instrument(skip(self, params), fields(client_id = %params.user_id))]
    pub async fn store_card(&self, params: &StoreCardParams) -> Result<String, EhrError> {
        let variables = json!({
            "token": params.token,
            "card_type_label": params.card_type_label.as_deref().unwrap_or("personal"),
            "user_id": params.user_id,
            "is_default": params.is_default,
        });

        let data: StoreCardData = self.execute(STORE_CARD_MUTATION, variables).await?;
        data.create_stripe_customer_detail
            .stripe_customer_detail
            .map(|detail| detail.id)
            .ok_or(EhrError::MissingData)
    }

    /// Charge a patient by creating a billing item; the idempotency key makes
    /// a retried submission safe on the remote side.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or no billing item id comes
    /// back.
    #[instrument(
        skip(self, params),
        fields(sender_id = %params.sender_id, offering_id = %params.offering_id)
    )]
    pub async fn charge_patient(&self, params: &ChargeParams) -> Result<String, EhrError> {
        let variables = json!({
            "amount_paid": params.amount_paid,
            "sender_id": params.sender_id,
            "requested_payment_id": params.requested_payment_id,
            "stripe_idempotency_key": params.stripe_idempotency_key,
            "stripe_customer_detail_id": params.stripe_customer_detail_id,
            "offering_id": params.offering_id,
            "should_charge": params.should_charge,
        });

        let data: BillingItemData = self.execute(CREATE_BILLING_ITEM_MUTATION, variables).await?;
        data.create_billing_item
            .billing_item
            .map(|item| item.id)
            .ok_or(EhrError::MissingData)
    }

    /// Create an invoice (requested payment) recording a subscription.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or no invoice comes back.
    #[instrument(skip(self), fields(client_id = %recipient_id, offering_id = %offering_id))]
    pub async fn create_invoice(
        &self,
        recipient_id: &str,
        offering_id: &str,
        price: &str,
        invoice_type: &str,
    ) -> Result<RequestedPayment, EhrError> {
        let variables = json!({
            "recipient_id": recipient_id,
            "offering_id": offering_id,
            "price": price,
            "invoice_type": invoice_type,
        });

        let data: RequestedPaymentData = self.execute(CREATE_INVOICE_MUTATION, variables).await?;
        data.create_requested_payment
            .requested_payment
            .ok_or(EhrError::MissingData)
    }

    /// Fetch the stored payment cards for a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(client_id = %user_id))]
    pub async fn payment_cards(&self, user_id: &str) -> Result<Vec<PaymentCard>, EhrError> {
        let data: PaymentCardsData = self
            .execute(PAYMENT_CARDS_QUERY, json!({ "user_id": user_id }))
            .await?;
        Ok(data.stripe_customer_details)
    }

    /// Fetch a client's package selections with their total count.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(client_id = %user_id))]
    pub async fn package_selections(
        &self,
        user_id: &str,
        offering_id: Option<&str>,
        offset: i64,
    ) -> Result<PackageSelections, EhrError> {
        let variables = json!({
            "offering_id": offering_id,
            "user_id": user_id,
            "offset": offset,
        });

        let data: PackageSelectionsData =
            self.execute(PACKAGE_SELECTIONS_QUERY, variables).await?;
        Ok(PackageSelections {
            count: data.count,
            selections: data.selections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_selections_data_deserializes() {
        let data: PackageSelectionsData = serde_json::from_str(
            r#"{
                "userPackageSelectionsCount": 2,
                "userPackageSelections": [
                    {"id": "s1", "status": "active", "offering": {"id": "o1"}},
                    {"id": "s2", "status": null, "offering": null}
                ]
            }"#,
        )
        .expect("valid data");
        assert_eq!(data.count, 2);
        assert_eq!(data.selections.len(), 2);
        assert_eq!(
            data.selections[0].offering.as_ref().expect("offering").id,
            "o1"
        );
    }

    #[test]
    fn test_billing_item_payload_deserializes() {
        let data: BillingItemData = serde_json::from_str(
            r#"{"createBillingItem": {"billingItem": {"id": "bi_1"}, "messages": null}}"#,
        )
        .expect("valid data");
        assert_eq!(
            data.create_billing_item.billing_item.expect("item").id,
            "bi_1"
        );
    }
}
