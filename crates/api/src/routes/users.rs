//! User route handlers: metric entries, eligibility and profile updates.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use clearwell_core::UserId;

use crate::db::users::UserUpdate;
use crate::ehr::{CreateEntryParams, Entry, FieldMessage, UpdateClientParams};
use crate::error::{AppError, Result};
use crate::models::User;
use crate::state::AppState;

/// Request body for recording a patient metric entry.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateEntryRequest {
    pub metric_stat: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub entry_type: Option<String>,
    pub user_id: i32,
    pub created_at: Option<String>,
}

/// Request body for updating a user profile.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub skipped_email: Option<bool>,
    pub phone_number: Option<String>,
    pub record_identifier: Option<String>,
    pub additional_record_identifier: Option<String>,
    pub height: Option<String>,
    /// Pushed to the remote platform only; not a local column.
    pub dob: Option<String>,
    /// Pushed to the remote platform only; not a local column.
    pub gender: Option<String>,
}

/// Response for a recorded metric entry.
#[derive(Debug, Serialize)]
pub struct CreateEntryResponse {
    pub message: String,
    pub entry: Option<Entry>,
    pub messages: Option<Vec<FieldMessage>>,
}

/// Record a patient metric entry on the remote platform.
pub async fn create_entry(
    State(state): State<AppState>,
    Json(body): Json<CreateEntryRequest>,
) -> Result<(StatusCode, Json<CreateEntryResponse>)> {
    let user = require_user(&state, body.user_id).await?;
    let client_id = require_linked_client(&user)?;

    let payload = state
        .composite()
        .create_entry(CreateEntryParams {
            metric_stat: body.metric_stat,
            category: body.category,
            entry_type: body.entry_type,
            user_id: client_id,
            created_at: body.created_at,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateEntryResponse {
            message: "Patient metrics entry created successfully".to_owned(),
            entry: payload.entry,
            messages: payload.messages,
        }),
    ))
}

/// Evaluate age and BMI gating for a user. Returns the bare boolean.
pub async fn check_eligibility(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<bool>> {
    let user = require_user(&state, id).await?;
    let client_id = require_linked_client(&user)?;

    let eligible = state.composite().check_eligibility(&client_id).await?;
    Ok(Json(eligible))
}

/// Update the local user row, then push the same changes to the remote
/// platform.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<User>> {
    let user = require_user(&state, id).await?;
    let client_id = require_linked_client(&user)?;

    let local = UserUpdate {
        first_name: body.first_name.clone(),
        last_name: body.last_name.clone(),
        email: body.email.clone(),
        skipped_email: body.skipped_email,
        phone_number: body.phone_number.clone(),
        record_identifier: body.record_identifier,
        additional_record_identifier: body.additional_record_identifier,
        height: body.height.clone(),
    };
    let remote = UpdateClientParams {
        email: body.email,
        first_name: body.first_name,
        last_name: body.last_name,
        dob: body.dob,
        gender: body.gender,
        height: body.height,
        phone_number: body.phone_number,
        location: None,
    };

    let updated = state
        .composite()
        .update_client(UserId::new(id), &client_id, local, remote)
        .await?;

    Ok(Json(updated))
}

/// Resolve a local user row or fail with 404.
async fn require_user(state: &AppState, user_id: i32) -> Result<User> {
    state
        .composite()
        .get_user_by_id(UserId::new(user_id))
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_owned()))
}

/// The remote client id a user must have before remote operations.
fn require_linked_client(user: &User) -> Result<String> {
    user.client_id
        .clone()
        .map(clearwell_core::ClientId::into_inner)
        .ok_or_else(|| AppError::Validation("user has no linked client".to_owned()))
}
