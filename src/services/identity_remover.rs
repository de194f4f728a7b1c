use crate::{
    capabilities::IdentityProvider,
    errors::{FatalDeletionError, IdentityNotFound, RemovalError},
    models::AuthenticatedIdentity,
};
use std::sync::Arc;

/// Final, irreversible step. Any failure other than a lost race is fatal
/// for the request.
#[derive(Clone)]
pub struct IdentityRemover {
    provider: Arc<dyn IdentityProvider>,
}

impl IdentityRemover {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    pub async fn remove(&self, identity: &AuthenticatedIdentity) -> Result<(), RemovalError> {
        match self.provider.remove(identity.id).await {
            Ok(()) => Ok(()),
            Err(source) if source.downcast_ref::<IdentityNotFound>().is_some() => {
                Err(RemovalError::AlreadyRemoved(identity.id))
            }
            Err(source) => Err(FatalDeletionError {
                identity: identity.id,
                source,
            }
            .into()),
        }
    }
}

#[cfg(test)]
#[path = "identity_remover_tests.rs"]
mod tests;
