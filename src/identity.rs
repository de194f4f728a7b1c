//! Identity provider adapter for a GoTrue-compatible auth API.
//!
//! Verification runs with the public (anon) key and the caller's own token.
//! Removal runs with the service-role key and never sees the caller's token.

use crate::{
    capabilities::IdentityProvider,
    errors::{AuthError, IdentityNotFound},
    models::AuthenticatedIdentity,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

const USER_AGENT: &str = "purge/0.1";

pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: Uuid,
}

#[derive(Clone)]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    service_key: String,
}

impl HttpIdentityProvider {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        anon_key: impl Into<String>,
        service_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            service_key: service_key.into(),
        }
    }

    fn user_url(&self) -> String {
        format!("{}/auth/v1/user", self.base_url)
    }

    fn admin_user_url(&self, id: Uuid) -> String {
        format!("{}/auth/v1/admin/users/{}", self.base_url, id)
    }
}

/// Statuses the provider uses to refuse a token, as opposed to failing to answer.
fn is_rejection(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::UNAUTHORIZED
            | StatusCode::FORBIDDEN
            | StatusCode::NOT_FOUND
            | StatusCode::UNPROCESSABLE_ENTITY
    )
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn verify(&self, token: &str) -> Result<AuthenticatedIdentity, AuthError> {
        let response = self
            .client
            .get(self.user_url())
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to reach identity provider")
            .map_err(AuthError::Unavailable)?;

        let status = response.status();
        if is_rejection(status) {
            return Err(AuthError::Rejected(format!(
                "identity provider answered {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(AuthError::Unavailable(anyhow::anyhow!(
                "Identity provider returned unexpected status {}",
                status
            )));
        }

        let user = response
            .json::<UserResponse>()
            .await
            .context("Failed to parse identity provider user response")
            .map_err(AuthError::Unavailable)?;

        Ok(AuthenticatedIdentity { id: user.id })
    }

    async fn remove(&self, id: Uuid) -> Result<()> {
        let response = self
            .client
            .delete(self.admin_user_url(id))
            .header("apikey", &self.service_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.service_key))
            .send()
            .await
            .context("Failed to reach identity provider admin API")?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(IdentityNotFound(id).into());
        }

        response
            .error_for_status()
            .with_context(|| format!("Identity provider refused to delete user {}", id))?;

        Ok(())
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
