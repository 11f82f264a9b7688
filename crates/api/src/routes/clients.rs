//! Client onboarding route handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use clearwell_core::Email;

use crate::ehr::{ClientPayload, CreateClientParams, UserGroup};
use crate::error::{AppError, Result};
use crate::middleware::CurrentActor;
use crate::services::effective_subject;
use crate::state::AppState;

/// Request body for creating a client.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateClientRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub phone_number: Option<String>,
    pub user_group_id: Option<String>,
    pub additional_record_identifier: Option<String>,
    #[serde(rename = "platformUser")]
    pub platform_user: Option<String>,
}

/// Query parameters for listing user groups.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserGroupsQuery {
    pub offset: Option<i64>,
}

/// Response listing patient groupings.
#[derive(Debug, Serialize)]
pub struct UserGroupsResponse {
    pub user_groups: Vec<UserGroup>,
}

/// Create a client on the remote platform and mirror it locally.
pub async fn create(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Json(body): Json<CreateClientRequest>,
) -> Result<Json<ClientPayload>> {
    let email = Email::parse(&body.email)
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let platform_user = effective_subject(&actor, body.platform_user.as_deref());

    let payload = state
        .composite()
        .create_client(
            CreateClientParams {
                first_name: body.first_name,
                last_name: body.last_name,
                email,
                phone_number: body.phone_number,
                user_group_id: body.user_group_id,
                additional_record_identifier: body.additional_record_identifier,
            },
            platform_user.as_deref(),
        )
        .await?;

    Ok(Json(payload))
}

/// List patient groupings.
pub async fn user_groups(
    CurrentActor(_actor): CurrentActor,
    State(state): State<AppState>,
    Query(query): Query<UserGroupsQuery>,
) -> Result<Json<UserGroupsResponse>> {
    let user_groups = state
        .composite()
        .retrieve_user_groups(query.offset.unwrap_or(1))
        .await?;
    Ok(Json(UserGroupsResponse { user_groups }))
}
