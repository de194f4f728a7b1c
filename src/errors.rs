use crate::models::{CleanupTarget, ErrorBody};
use axum::{
    http,
    response::{self, IntoResponse},
    Json,
};
use std::{error, fmt};
use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

pub const MISSING_CREDENTIAL_MESSAGE: &str = "Missing authorization header";
pub const INVALID_CREDENTIAL_MESSAGE: &str = "Invalid or expired token";
pub const DELETION_FAILED_MESSAGE: &str = "Failed to delete account";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingCredential,

    #[error("Authorization header is not a bearer credential")]
    Malformed,

    #[error("Credential rejected by identity provider: {0}")]
    Rejected(String),

    #[error("Identity provider unavailable: {0}")]
    Unavailable(#[source] anyhow::Error),
}

#[derive(Debug, Error)]
#[error("Cleanup of {target} failed: {source:#}")]
pub struct CleanupError {
    pub target: CleanupTarget,
    #[source]
    pub source: anyhow::Error,
}

#[derive(Debug, Error)]
#[error("Failed to remove identity {identity}: {source:#}")]
pub struct FatalDeletionError {
    pub identity: Uuid,
    #[source]
    pub source: anyhow::Error,
}

/// The identity provider has no record of the identity it was asked to remove.
#[derive(Debug, Error)]
#[error("Identity {0} not found")]
pub struct IdentityNotFound(pub Uuid);

#[derive(Debug, Error)]
pub enum RemovalError {
    /// Another request removed the identity first.
    #[error("Identity {0} was already removed")]
    AlreadyRemoved(Uuid),

    #[error(transparent)]
    Fatal(#[from] FatalDeletionError),
}

#[derive(Debug)]
pub enum AppError {
    // 4xx
    Unauthorized(AuthError),

    // 5xx
    DeletionFailed(FatalDeletionError),
    Internal(anyhow::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Unauthorized(err) => write!(f, "Unauthorized: {}", err),
            AppError::DeletionFailed(err) => write!(f, "Deletion failed: {}", err),
            AppError::Internal(err) => write!(f, "Internal error: {}", err),
        }
    }
}

impl error::Error for AppError {}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unavailable(source) => AppError::Internal(source),
            other => AppError::Unauthorized(other),
        }
    }
}

impl From<FatalDeletionError> for AppError {
    fn from(err: FatalDeletionError) -> Self {
        AppError::DeletionFailed(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> response::Response {
        let (status, message) = match &self {
            // 4xx
            AppError::Unauthorized(AuthError::MissingCredential) => {
                (http::StatusCode::UNAUTHORIZED, MISSING_CREDENTIAL_MESSAGE)
            }
            AppError::Unauthorized(err) => {
                tracing::info!("Rejected deletion request: {}", err);
                (http::StatusCode::UNAUTHORIZED, INVALID_CREDENTIAL_MESSAGE)
            }

            // 5xx
            AppError::DeletionFailed(err) => {
                tracing::error!(identity = %err.identity, "Identity removal failed: {:?}", err.source);
                (
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    DELETION_FAILED_MESSAGE,
                )
            }
            AppError::Internal(err) => {
                tracing::error!("Internal error: {:?}", err);
                (
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE,
                )
            }
        };

        let body = Json(ErrorBody {
            error: message.to_string(),
        });

        (status, body).into_response()
    }
}

impl AppError {
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        AppError::Internal(err.into())
    }
}

/// Response used by the outermost panic guard. Carries no detail about the fault.
pub fn internal_error_response() -> response::Response {
    AppError::internal(anyhow::anyhow!("handler panicked")).into_response()
}

pub(crate) fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();

    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value for field '{}'", field));

            messages.push(message);
        }
    }

    messages.join(", ")
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
