//! Intake form route handlers.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{AppError, Result};
use crate::middleware::CurrentActor;
use crate::state::AppState;

/// Request body for uploading intake answers.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadAnswersRequest {
    pub answers: Option<Map<String, Value>>,
    #[serde(rename = "platformUser")]
    pub platform_user: Option<String>,
}

/// Submit intake form answers to the intake platform.
pub async fn upload_answers(
    CurrentActor(_actor): CurrentActor,
    State(state): State<AppState>,
    Json(body): Json<UploadAnswersRequest>,
) -> Result<Json<Value>> {
    let answers = body
        .answers
        .filter(|answers| !answers.is_empty())
        .ok_or_else(|| AppError::Validation("Form answers are required".to_owned()))?;

    let result = state.composite().upload_form_answers(&answers).await?;
    Ok(Json(result))
}
