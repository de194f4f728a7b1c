use crate::{
    errors::{AppError, AuthError},
    models::{DeletionRequest, DeletionSuccess},
    state::AppState,
};
use axum::{
    extract::State,
    http::{header, HeaderMap},
    routing, Json, Router,
};

/// Deletes the caller's account.
///
/// The caller only learns whether authentication passed and whether the
/// identity is gone. Individual cleanup failures stay in the logs.
pub async fn delete_account(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DeletionSuccess>, AppError> {
    let bearer_credential = headers
        .get(header::AUTHORIZATION)
        .map(|value| value.to_str().map(str::to_string))
        .transpose()
        .map_err(|_| AppError::Unauthorized(AuthError::Malformed))?;

    let outcome = state
        .orchestrator
        .run(&DeletionRequest::new(bearer_credential))
        .await?;

    if let Some(fatal) = outcome.fatal {
        return Err(fatal.into());
    }

    Ok(Json(DeletionSuccess::default()))
}

pub fn create_route() -> Router<AppState> {
    Router::new().route("/delete-account", routing::post(delete_account))
}

pub fn create_route_v1() -> Router<AppState> {
    Router::new().route("/account", routing::delete(delete_account))
}

#[cfg(test)]
#[path = "account_tests.rs"]
mod tests;
