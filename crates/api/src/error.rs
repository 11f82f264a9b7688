//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`; this is the single point where thrown errors become
//! an HTTP status and a `{"error": ...}` JSON body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::ehr::EhrError;
use crate::intake::IntakeError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request failed local validation before any remote call.
    #[error("{0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Identity/EHR platform operation failed.
    #[error("EHR error: {0}")]
    Ehr(#[from] EhrError),

    /// Forms-intake platform operation failed.
    #[error("Intake error: {0}")]
    Intake(#[from] IntakeError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Capture unexpected server errors; an unreachable upstream is an
        // availability signal, not a defect worth a Sentry event.
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else if status == StatusCode::SERVICE_UNAVAILABLE {
            tracing::warn!(error = %self, "Upstream service unavailable");
        }

        // Remote validation messages from client creation are relayed to the
        // caller; everything else server-side stays generic.
        if let Self::Ehr(EhrError::ClientCreation { problems, messages }) = &self {
            let body = serde_json::json!({
                "error": "Client creation error",
                "problems": problems,
                "messages": messages,
            });
            return (status, Json(body)).into_response();
        }

        let message = match &self {
            Self::Validation(msg) => msg.clone(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::Ehr(EhrError::Unavailable) => EhrError::Unavailable.to_string(),
            Self::Intake(IntakeError::Unavailable) => IntakeError::Unavailable.to_string(),
            // Don't expose internal error details to clients
            Self::Database(_) | Self::Ehr(_) | Self::Intake(_) => {
                "An unexpected error occurred".to_string()
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl AppError {
    /// HTTP status for this error per the response convention: 400 for
    /// validation failures, 404 for lookup misses, 503 when an upstream gave
    /// no response at all, 500 for everything unexpected.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Ehr(EhrError::Unavailable) | Self::Intake(IntakeError::Unavailable) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Database(_) | Self::Ehr(_) | Self::Intake(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Validation("zip is required".to_string());
        assert_eq!(err.to_string(), "zip is required");

        let err = AppError::NotFound("User".to_string());
        assert_eq!(err.to_string(), "User not found");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::Validation("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("User".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Ehr(EhrError::Unavailable).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Intake(IntakeError::Unavailable).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_remote_business_error_is_500() {
        let err = AppError::Ehr(EhrError::MissingData);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
