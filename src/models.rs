use crate::{errors::FatalDeletionError, utils::regex_utils};
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fmt};
use uuid::Uuid;
use validator::ValidationError;

pub const DELETION_SUCCESS_MESSAGE: &str = "Account deleted successfully";

fn invalid_name(code: &'static str, value: &str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.add_param(Cow::from("value"), &value);
    error.message = Some(Cow::from(format!("'{}' is not a valid name", value)));
    error
}

/// One inbound deletion call. Only the raw `Authorization` header is kept.
#[derive(Debug, Clone, Default)]
pub struct DeletionRequest {
    pub bearer_credential: Option<String>,
}

impl DeletionRequest {
    pub fn new(bearer_credential: Option<String>) -> Self {
        Self { bearer_credential }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedIdentity {
    pub id: Uuid,
}

impl AuthenticatedIdentity {
    /// Object-store prefix under which every object of this identity lives.
    pub fn storage_prefix(&self) -> String {
        format!("{}/", self.id)
    }
}

impl fmt::Display for AuthenticatedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.id.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CleanupTarget {
    Storage { bucket: String },
    Table { table: String },
}

impl CleanupTarget {
    pub fn storage(bucket: impl Into<String>) -> Result<Self, ValidationError> {
        let bucket = bucket.into();
        if !regex_utils::BUCKET_NAME_REGEX.is_match(&bucket) {
            return Err(invalid_name("invalid_bucket_name", &bucket));
        }
        Ok(Self::Storage { bucket })
    }

    pub fn table(table: impl Into<String>) -> Result<Self, ValidationError> {
        let table = table.into();
        if !regex_utils::SQL_IDENTIFIER_REGEX.is_match(&table) {
            return Err(invalid_name("invalid_table_name", &table));
        }
        Ok(Self::Table { table })
    }
}

impl fmt::Display for CleanupTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanupTarget::Storage { bucket } => write!(f, "storage:{}", bucket),
            CleanupTarget::Table { table } => write!(f, "table:{}", table),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CleanupStatus {
    Succeeded,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupOutcome {
    pub target: CleanupTarget,
    pub status: CleanupStatus,
}

impl CleanupOutcome {
    pub fn succeeded(target: CleanupTarget) -> Self {
        Self {
            target,
            status: CleanupStatus::Succeeded,
        }
    }

    pub fn failed(target: CleanupTarget, reason: impl Into<String>) -> Self {
        Self {
            target,
            status: CleanupStatus::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, CleanupStatus::Succeeded)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionState {
    Init,
    Authenticating,
    CleaningResources,
    RemovingIdentity,
    Completed,
    AuthRejected,
    DeletionFailed,
}

impl DeletionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DeletionState::Completed | DeletionState::AuthRejected | DeletionState::DeletionFailed
        )
    }
}

impl fmt::Display for DeletionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeletionState::Init => "init",
            DeletionState::Authenticating => "authenticating",
            DeletionState::CleaningResources => "cleaning_resources",
            DeletionState::RemovingIdentity => "removing_identity",
            DeletionState::Completed => "completed",
            DeletionState::AuthRejected => "auth_rejected",
            DeletionState::DeletionFailed => "deletion_failed",
        };
        f.write_str(name)
    }
}

/// Terminal result of a run that got past authentication.
#[derive(Debug)]
pub struct DeletionOutcome {
    pub identity: AuthenticatedIdentity,
    pub cleanup_outcomes: Vec<CleanupOutcome>,
    pub identity_removed: bool,
    pub fatal: Option<FatalDeletionError>,
}

impl DeletionOutcome {
    pub fn state(&self) -> DeletionState {
        if self.identity_removed && self.fatal.is_none() {
            DeletionState::Completed
        } else {
            DeletionState::DeletionFailed
        }
    }

    pub fn failed_cleanups(&self) -> impl Iterator<Item = &CleanupOutcome> {
        self.cleanup_outcomes.iter().filter(|o| !o.is_success())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeletionSuccess {
    pub success: bool,
    pub message: String,
}

impl Default for DeletionSuccess {
    fn default() -> Self {
        Self {
            success: true,
            message: DELETION_SUCCESS_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;
