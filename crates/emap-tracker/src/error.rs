use crate::accounts::credentials::CredentialError;
use crate::accounts::lifecycle::Transition;
use crate::authorization::Action;
use crate::config::ConfigError;
use crate::domain::{RecordKind, UserState, ValidationErrors};
use crate::store::StoreError;
use crate::telemetry::TelemetryError;

/// Failures of a single tracker operation. Every variant is scoped to the request
/// that raised it and leaves committed state untouched.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("permission denied: cannot {action} {resource}")]
    PermissionDenied {
        action: Action,
        resource: &'static str,
    },
    #[error("validation failed: {0}")]
    ValidationFailed(ValidationErrors),
    #[error("{transition} is not allowed for an account that is {state}")]
    InvalidTransition {
        transition: Transition,
        state: UserState,
    },
    #[error("access key is invalid, expired, or already used")]
    InvalidOrConsumedKey,
    #[error("could not create the required {kind} record")]
    PopulationFailure {
        kind: RecordKind,
        #[source]
        source: StoreError,
    },
    #[error("{resource} not found")]
    NotFound { resource: &'static str },
    #[error(transparent)]
    Store(StoreError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl ServiceError {
    pub(crate) fn denied(action: Action, resource: &'static str) -> Self {
        Self::PermissionDenied { action, resource }
    }

    pub(crate) fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::ValidationFailed(ValidationErrors::single(field, message))
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(value: ValidationErrors) -> Self {
        Self::ValidationFailed(value)
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::UniqueViolation { fields, .. } => {
                let mut errors = ValidationErrors::new();
                for field in fields.iter().copied() {
                    errors.add(field, "has already been taken");
                }
                Self::ValidationFailed(errors)
            }
            StoreError::NotFound { entity } => Self::NotFound { resource: entity },
            other => Self::Store(other),
        }
    }
}

/// Process-level failures surfaced by the binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("service error: {0}")]
    Service(#[from] ServiceError),
}
