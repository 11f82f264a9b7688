//! User and metric-entry operations against the identity/EHR platform.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use super::{EhrClient, EhrError, FieldMessage};

const GET_USER_QUERY: &str = r"
    query getUser($id: ID) {
        user(id: $id) {
            id
            first_name
            last_name
            dob
            gender
            email
            phone_number
            next_appt_date
            weight
            height
        }
    }
";

const CREATE_ENTRY_MUTATION: &str = r"
    mutation createEntry(
        $metric_stat: String,
        $category: String,
        $type: String,
        $user_id: String,
        $created_at: String
    ) {
        createEntry(input: {
            metric_stat: $metric_stat,
            category: $category,
            type: $type,
            user_id: $user_id,
            created_at: $created_at
        }) {
            entry {
                id
                category
                type
            }
            messages {
                field
                message
            }
        }
    }
";

/// The authoritative user record held by the remote platform. Not persisted
/// locally; fetched transiently for eligibility evaluation and profile reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteUser {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub next_appt_date: Option<String>,
    /// Weight as reported by the platform, e.g. `"200 lbs"`.
    pub weight: Option<String>,
    /// Height in inches.
    pub height: Option<f64>,
    pub dietitian_id: Option<String>,
    pub record_identifier: Option<String>,
    pub additional_record_identifier: Option<String>,
}

/// Parameters for recording a patient metric entry.
#[derive(Debug, Clone)]
pub struct CreateEntryParams {
    pub metric_stat: Option<String>,
    pub category: Option<String>,
    pub entry_type: Option<String>,
    pub user_id: String,
    pub created_at: Option<String>,
}

/// A recorded metric entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub entry_type: Option<String>,
}

/// createEntry mutation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryPayload {
    pub entry: Option<Entry>,
    pub messages: Option<Vec<FieldMessage>>,
}

#[derive(Deserialize)]
struct GetUserData {
    user: Option<RemoteUser>,
}

#[derive(Deserialize)]
struct CreateEntryData {
    #[serde(rename = "createEntry")]
    create_entry: EntryPayload,
}

impl EhrClient {
    /// Fetch the authoritative user record by remote client id.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails; `Ok(None)` when the
    /// platform knows no such user.
    #[instrument(skip(self), fields(client_id = %id))]
    pub async fn get_user(&self, id: &str) -> Result<Option<RemoteUser>, EhrError> {
        let data: GetUserData = self.execute(GET_USER_QUERY, json!({ "id": id })).await?;
        Ok(data.user)
    }

    /// Record a patient metric entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or reports errors.
    #[instrument(skip(self, params), fields(client_id = %params.user_id))]
    pub async fn create_entry(
        &self,
        params: &CreateEntryParams,
    ) -> Result<EntryPayload, EhrError> {
        let variables = json!({
            "metric_stat": params.metric_stat,
            "category": params.category,
            "type": params.entry_type,
            "user_id": params.user_id,
            "created_at": params.created_at,
        });

        let data: CreateEntryData = self.execute(CREATE_ENTRY_MUTATION, variables).await?;
        Ok(data.create_entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_user_deserializes_partial_record() {
        let user: RemoteUser = serde_json::from_str(
            r#"{"id": "u1", "dob": "1990-05-20", "weight": "200 lbs", "height": 70}"#,
        )
        .expect("valid user");
        assert_eq!(user.id, "u1");
        assert_eq!(user.dob.as_deref(), Some("1990-05-20"));
        assert_eq!(user.weight.as_deref(), Some("200 lbs"));
        assert!((user.height.expect("height") - 70.0).abs() < f64::EPSILON);
        assert!(user.email.is_none());
    }

    #[test]
    fn test_entry_payload_renames_type() {
        let payload: EntryPayload = serde_json::from_str(
            r#"{"entry": {"id": "e1", "category": "Weight", "type": "MetricEntry"}}"#,
        )
        .expect("valid payload");
        let entry = payload.entry.expect("entry");
        assert_eq!(entry.entry_type.as_deref(), Some("MetricEntry"));
    }
}
