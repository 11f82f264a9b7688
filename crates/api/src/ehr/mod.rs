//! Identity/EHR platform GraphQL client.
//!
//! # Architecture
//!
//! - Single POST endpoint accepting `{query, variables}`
//! - The platform reports failures through two channels, both of which must
//!   be checked even on HTTP 200: a top-level `errors` array (each entry
//!   carrying `extensions.problems` detail) and a `messages` list embedded
//!   in a mutation's payload (field + message pairs)
//! - Transport-level failures (no HTTP response at all) are normalized to a
//!   fixed unavailability error, distinct from remote-reported business
//!   errors
//! - No retries: a transient failure surfaces immediately to the caller
//!
//! Query documents are authored by hand; the vendor publishes no SDL, so
//! `graphql_client` contributes the wire envelope types only.

mod billing;
mod clients;
mod users;

pub use billing::{
    ChargeParams, OfferingsQuery, PackageSelection, PackageSelections, PaymentCard,
    RemoteOffering, RequestedPayment, SelectionOffering, StoreCardParams,
};
pub use clients::{ClientPayload, CreateClientParams, LocationInput, UpdateClientParams, UserGroup};
pub use users::{CreateEntryParams, Entry, EntryPayload, RemoteUser};

use std::sync::Arc;

use graphql_client::Response;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::config::EhrConfig;

/// A field-level validation message embedded in a mutation payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldMessage {
    pub field: Option<String>,
    pub message: Option<String>,
}

/// Errors that can occur when interacting with the identity/EHR platform.
#[derive(Debug, Error)]
pub enum EhrError {
    /// No HTTP response at all (connect failure, timeout, DNS).
    #[error("EHR API service is unavailable")]
    Unavailable,

    /// The endpoint answered with a non-success HTTP status.
    #[error("EHR API returned status {status}: {message}")]
    Api { status: u16, message: String },

    /// The response carried a top-level GraphQL `errors` array.
    #[error("GraphQL errors: {}", .0.join("; "))]
    GraphQL(Vec<String>),

    /// Client creation was rejected; carries the remote validation detail
    /// for the caller to relay.
    #[error("client creation error")]
    ClientCreation {
        problems: Vec<String>,
        messages: Vec<FieldMessage>,
    },

    /// The response body was not valid JSON for the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// HTTP 200 with neither data nor errors.
    #[error("no data in EHR response")]
    MissingData,

    /// The client could not be constructed from configuration.
    #[error("invalid EHR configuration: {0}")]
    Config(String),
}

/// Client for the identity/EHR platform's GraphQL API.
#[derive(Clone)]
pub struct EhrClient {
    inner: Arc<EhrClientInner>,
}

struct EhrClientInner {
    client: reqwest::Client,
    endpoint: String,
    dietitian_id: Option<String>,
    skipped_email: Option<bool>,
    dont_send_welcome: Option<bool>,
}

#[derive(Serialize)]
struct GraphQLRequest<'a, V: Serialize> {
    query: &'a str,
    variables: V,
}

impl EhrClient {
    /// Create a new EHR API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &EhrConfig) -> Result<Self, EhrError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Basic {}", config.api_key.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| EhrError::Config(format!("invalid API key format: {e}")))?,
        );
        headers.insert("AuthorizationSource", HeaderValue::from_static("API"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| EhrError::Config(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(EhrClientInner {
                client,
                endpoint: config.api_url.clone(),
                dietitian_id: config.dietitian_id.clone(),
                skipped_email: config.skipped_email,
                dont_send_welcome: config.dont_send_welcome,
            }),
        })
    }

    /// Provider id attached to created clients.
    fn dietitian_id(&self) -> Option<&str> {
        self.inner.dietitian_id.as_deref()
    }

    fn skipped_email(&self) -> Option<bool> {
        self.inner.skipped_email
    }

    fn dont_send_welcome(&self) -> Option<bool> {
        self.inner.dont_send_welcome
    }

    /// Execute a GraphQL operation.
    ///
    /// Checks the HTTP status and the top-level `errors` array; payload
    /// `messages` are left to the typed operations because they live inside
    /// operation-specific shapes.
    async fn execute<V, D>(&self, query: &'static str, variables: V) -> Result<D, EhrError>
    where
        V: Serialize,
        D: DeserializeOwned,
    {
        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .json(&GraphQLRequest { query, variables })
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "EHR request failed without a response");
                EhrError::Unavailable
            })?;

        let status = response.status();
        let response_text = response.text().await.map_err(|e| {
            tracing::warn!(error = %e, "EHR response body could not be read");
            EhrError::Unavailable
        })?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "EHR API returned non-success status"
            );
            return Err(EhrError::Api {
                status: status.as_u16(),
                message: response_text.chars().take(200).collect(),
            });
        }

        let response: Response<D> = serde_json::from_str(&response_text)?;

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            tracing::debug!(errors = ?errors, "GraphQL errors in EHR response");
            return Err(EhrError::GraphQL(collect_error_details(&errors)));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                body = %response_text.chars().take(500).collect::<String>(),
                "EHR GraphQL response has no data and no errors"
            );
            EhrError::MissingData
        })
    }
}

/// Render each GraphQL error, preferring the `extensions.problems` detail
/// over the bare message when present.
fn collect_error_details(errors: &[graphql_client::Error]) -> Vec<String> {
    errors
        .iter()
        .map(|error| {
            error
                .extensions
                .as_ref()
                .and_then(|ext| ext.get("problems"))
                .map_or_else(|| error.message.clone(), ToString::to_string)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_error_details_prefers_problems() {
        let raw = serde_json::json!([
            {
                "message": "Validation failed",
                "extensions": {
                    "problems": [{"path": ["email"], "explanation": "is taken"}]
                }
            },
            {"message": "Something else went wrong"}
        ]);
        let errors: Vec<graphql_client::Error> =
            serde_json::from_value(raw).expect("valid errors");

        let details = collect_error_details(&errors);
        assert_eq!(details.len(), 2);
        assert!(details[0].contains("is taken"));
        assert_eq!(details[1], "Something else went wrong");
    }

    #[test]
    fn test_error_display_joins_details() {
        let err = EhrError::GraphQL(vec!["first".to_string(), "second".to_string()]);
        assert_eq!(err.to_string(), "GraphQL errors: first; second");
    }

    #[test]
    fn test_response_envelope_parses_both_channels() {
        // A 200 response can carry errors instead of data; both must be seen
        let body = r#"{
            "data": null,
            "errors": [{"message": "boom", "extensions": {"problems": []}}]
        }"#;
        let parsed: Response<serde_json::Value> =
            serde_json::from_str(body).expect("valid envelope");
        assert!(parsed.data.is_none() || parsed.data == Some(serde_json::Value::Null));
        assert_eq!(parsed.errors.expect("errors").len(), 1);
    }
}
