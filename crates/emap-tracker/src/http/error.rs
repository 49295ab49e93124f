use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::error::ServiceError;

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            ServiceError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::InvalidTransition { .. } => StatusCode::CONFLICT,
            ServiceError::InvalidOrConsumedKey => StatusCode::GONE,
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::PopulationFailure { .. }
            | ServiceError::Store(_)
            | ServiceError::Credential(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let payload = match &self {
            ServiceError::PermissionDenied { action, resource } => json!({
                "error": self.to_string(),
                "action": action,
                "resource": resource,
            }),
            ServiceError::ValidationFailed(errors) => json!({
                "error": "validation failed",
                "fields": errors,
            }),
            ServiceError::InvalidTransition { transition, state } => json!({
                "error": self.to_string(),
                "transition": transition,
                "state": state,
            }),
            ServiceError::InvalidOrConsumedKey | ServiceError::NotFound { .. } => json!({
                "error": self.to_string(),
            }),
            ServiceError::PopulationFailure { .. }
            | ServiceError::Store(_)
            | ServiceError::Credential(_) => {
                error!(error = %self, "request failed");
                json!({
                    "error": "internal server error",
                })
            }
        };

        (status, Json(payload)).into_response()
    }
}
