//! Actor extraction.
//!
//! Authentication and JWT verification happen upstream of this service; the
//! verified identity arrives on forwarded headers. This extractor only reads
//! them - it never validates credentials.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};

use crate::services::Actor;
use crate::state::AppState;

/// Header carrying the upstream-verified platform user id.
const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying a comma-separated role list.
const USER_ROLES_HEADER: &str = "x-user-roles";

/// Extractor for the verified caller identity.
///
/// Rejects with 401 when no identity was forwarded, unless `DISABLE_AUTH`
/// is set (local development), in which case an anonymous actor is produced.
pub struct CurrentActor(pub Actor);

/// Rejection returned when identity headers are required but absent.
pub struct MissingIdentity;

impl IntoResponse for MissingIdentity {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "User information not available in the request"
            })),
        )
            .into_response()
    }
}

impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = MissingIdentity;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_owned);

        let roles = parts
            .headers
            .get(USER_ROLES_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|role| !role.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        if id.is_none() && !state.config().disable_auth {
            return Err(MissingIdentity);
        }

        Ok(Self(Actor { id, roles }))
    }
}
