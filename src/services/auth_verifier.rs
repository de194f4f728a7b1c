use crate::{
    capabilities::IdentityProvider,
    errors::AuthError,
    models::{AuthenticatedIdentity, DeletionRequest},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthVerifier {
    provider: Arc<dyn IdentityProvider>,
}

impl AuthVerifier {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    /// Resolves the request's bearer credential to an identity.
    ///
    /// A single remote call at most; the result is never cached.
    pub async fn verify(
        &self,
        request: &DeletionRequest,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let header = request
            .bearer_credential
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(AuthError::MissingCredential)?;
        let token = bearer_token(header).ok_or(AuthError::Malformed)?;

        self.provider.verify(token).await
    }
}

/// Extracts the token from `Bearer <token>`. The scheme is case-insensitive.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty() && !token.contains(char::is_whitespace)).then_some(token)
}

#[cfg(test)]
#[path = "auth_verifier_tests.rs"]
mod tests;
