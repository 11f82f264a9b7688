//! Composite flow route handlers.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Map, Value};

use clearwell_core::Email;

use crate::ehr::CreateClientParams;
use crate::error::{AppError, Result};
use crate::middleware::CurrentActor;
use crate::services::effective_subject;
use crate::state::AppState;

/// Request body for the complete-questionnaire flow.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompleteQuestionnaireRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub phone_number: Option<String>,
    pub user_group_id: Option<String>,
    pub additional_record_identifier: Option<String>,
    pub answers: Option<Map<String, Value>>,
    #[serde(rename = "platformUser")]
    pub platform_user: Option<String>,
}

/// Onboard a patient and submit their intake answers in one call: create
/// the client remotely and locally, stamp the new remote id onto the
/// answers, then upload them.
pub async fn complete_questionnaire(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Json(body): Json<CompleteQuestionnaireRequest>,
) -> Result<Json<Value>> {
    let answers = body
        .answers
        .filter(|answers| !answers.is_empty())
        .ok_or_else(|| AppError::Validation("Form answers are required".to_owned()))?;

    let email = Email::parse(&body.email)
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let platform_user = effective_subject(&actor, body.platform_user.as_deref());

    let result = state
        .composite()
        .complete_questionnaire(
            CreateClientParams {
                first_name: body.first_name,
                last_name: body.last_name,
                email,
                phone_number: body.phone_number,
                user_group_id: body.user_group_id,
                additional_record_identifier: body.additional_record_identifier,
            },
            answers,
            platform_user.as_deref(),
        )
        .await?;

    Ok(Json(result))
}
