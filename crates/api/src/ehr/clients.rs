//! Client management operations against the identity/EHR platform.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use clearwell_core::Email;

use super::{EhrClient, EhrError, FieldMessage, users::RemoteUser};

const CREATE_CLIENT_MUTATION: &str = r"
    mutation createClient($input: createClientInput!) {
        createClient(input: $input) {
            user {
                id
                first_name
                last_name
                email
                phone_number
                dietitian_id
                record_identifier
                additional_record_identifier
                height
            }
            messages {
                field
                message
            }
        }
    }
";

const UPDATE_CLIENT_MUTATION: &str = r"
    mutation updateClient($input: updateClientInput!) {
        updateClient(input: $input) {
            user {
                id
                first_name
                last_name
                email
                dob
                gender
                height
                phone_number
            }
            messages {
                field
                message
            }
        }
    }
";

const USER_GROUPS_QUERY: &str = r"
    query userGroups($offset: Int, $sort_by: String) {
        userGroups(offset: $offset, sort_by: $sort_by, should_paginate: true) {
            id
            name
            users_count
        }
    }
";

/// Parameters for creating a client on the remote platform.
///
/// The platform requires an email; missing first/last names default to the
/// email's local part.
#[derive(Debug, Clone)]
pub struct CreateClientParams {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Email,
    pub phone_number: Option<String>,
    pub user_group_id: Option<String>,
    pub additional_record_identifier: Option<String>,
}

/// A postal location pushed with a client update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationInput {
    pub line1: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
}

/// Parameters for updating a client on the remote platform.
#[derive(Debug, Clone, Default)]
pub struct UpdateClientParams {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<String>,
    pub height: Option<String>,
    pub phone_number: Option<String>,
    pub location: Option<LocationInput>,
}

/// Mutation payload carrying the affected user and any field messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientPayload {
    pub user: Option<RemoteUser>,
    pub messages: Option<Vec<FieldMessage>>,
}

/// A patient grouping on the remote platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserGroup {
    pub id: String,
    pub name: Option<String>,
    pub users_count: Option<i64>,
}

#[derive(Deserialize)]
struct CreateClientData {
    #[serde(rename = "createClient")]
    create_client: ClientPayload,
}

#[derive(Deserialize)]
struct UpdateClientData {
    #[serde(rename = "updateClient")]
    update_client: ClientPayload,
}

#[derive(Deserialize)]
struct UserGroupsData {
    #[serde(rename = "userGroups")]
    user_groups: Vec<UserGroup>,
}

/// Build the createClient input, defaulting missing names to the email's
/// local part.
fn create_client_input(
    params: &CreateClientParams,
    dietitian_id: Option<&str>,
    skipped_email: Option<bool>,
    dont_send_welcome: Option<bool>,
) -> serde_json::Value {
    let fallback_name = params.email.local_part();
    json!({
        "first_name": params
            .first_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(fallback_name),
        "last_name": params
            .last_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(fallback_name),
        "email": params.email.as_str(),
        "phone_number": params.phone_number,
        "dietitian_id": dietitian_id,
        "skipped_email": skipped_email,
        "dont_send_welcome": dont_send_welcome,
        "additional_record_identifier": params
            .additional_record_identifier
            .clone()
            .unwrap_or_default(),
    })
}

impl EhrClient {
    /// Create a client on the remote platform.
    ///
    /// # Errors
    ///
    /// Returns [`EhrError::ClientCreation`] carrying the remote validation
    /// detail when either error channel reports a problem, or other
    /// [`EhrError`] variants for transport and parse failures.
    #[instrument(skip(self, params), fields(email = %params.email))]
    pub async fn create_client(
        &self,
        params: &CreateClientParams,
    ) -> Result<ClientPayload, EhrError> {
        let input = create_client_input(
            params,
            self.dietitian_id(),
            self.skipped_email(),
            self.dont_send_welcome(),
        );

        let data: CreateClientData = self
            .execute(CREATE_CLIENT_MUTATION, json!({ "input": input }))
            .await
            .map_err(|e| match e {
                EhrError::GraphQL(problems) => EhrError::ClientCreation {
                    problems,
                    messages: vec![],
                },
                other => other,
            })?;

        let payload = data.create_client;
        if let Some(messages) = &payload.messages
            && !messages.is_empty()
        {
            return Err(EhrError::ClientCreation {
                problems: vec![],
                messages: messages.clone(),
            });
        }
        if payload.user.is_none() {
            return Err(EhrError::MissingData);
        }

        Ok(payload)
    }

    /// Push a client update to the remote platform.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or reports messages.
    #[instrument(skip(self, params), fields(client_id = %client_id))]
    pub async fn update_client(
        &self,
        client_id: &str,
        params: &UpdateClientParams,
    ) -> Result<ClientPayload, EhrError> {
        let input = json!({
            "id": client_id,
            "email": params.email,
            "first_name": params.first_name,
            "last_name": params.last_name,
            "dob": params.dob,
            "gender": params.gender,
            "height": params.height,
            "phone_number": params.phone_number,
            "location": params.location,
        });

        let data: UpdateClientData = self
            .execute(UPDATE_CLIENT_MUTATION, json!({ "input": input }))
            .await?;

        Ok(data.update_client)
    }

    /// Fetch patient groupings, paginated and sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn user_groups(&self, offset: i64) -> Result<Vec<UserGroup>, EhrError> {
        let data: UserGroupsData = self
            .execute(
                USER_GROUPS_QUERY,
                json!({ "offset": offset, "sort_by": "name" }),
            )
            .await?;
        Ok(data.user_groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(first: Option<&str>, last: Option<&str>) -> CreateClientParams {
        CreateClientParams {
            first_name: first.map(str::to_owned),
            last_name: last.map(str::to_owned),
            email: Email::parse("jane.doe@example.com").expect("valid email"),
            phone_number: Some("5550100".to_owned()),
            user_group_id: None,
            additional_record_identifier: None,
        }
    }

    #[test]
    fn test_input_defaults_names_from_email_local_part() {
        let input = create_client_input(&params(None, None), Some("42"), Some(true), Some(true));
        assert_eq!(input["first_name"], "jane.doe");
        assert_eq!(input["last_name"], "jane.doe");
        assert_eq!(input["email"], "jane.doe@example.com");
        assert_eq!(input["dietitian_id"], "42");
    }

    #[test]
    fn test_input_keeps_supplied_names() {
        let input = create_client_input(&params(Some("Jane"), Some("Doe")), None, None, None);
        assert_eq!(input["first_name"], "Jane");
        assert_eq!(input["last_name"], "Doe");
    }

    #[test]
    fn test_input_treats_empty_names_as_missing() {
        let input = create_client_input(&params(Some(""), Some("Doe")), None, None, None);
        assert_eq!(input["first_name"], "jane.doe");
        assert_eq!(input["last_name"], "Doe");
    }

    #[test]
    fn test_input_defaults_record_identifier_to_empty() {
        let input = create_client_input(&params(None, None), None, None, None);
        assert_eq!(input["additional_record_identifier"], "");
    }

    #[test]
    fn test_payload_messages_deserialize() {
        let payload: ClientPayload = serde_json::from_str(
            r#"{"user": null, "messages": [{"field": "email", "message": "is invalid"}]}"#,
        )
        .expect("valid payload");
        let messages = payload.messages.expect("messages");
        assert_eq!(messages[0].field.as_deref(), Some("email"));
        assert_eq!(messages[0].message.as_deref(), Some("is invalid"));
    }
}
