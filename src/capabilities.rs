//! Remote collaborators the deletion workflow depends on.
//!
//! Each trait is the narrowest surface the workflow needs from an external
//! service. Production adapters live next to the component that uses them;
//! tests substitute in-memory fakes.

use crate::{errors::AuthError, models::AuthenticatedIdentity};
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves an end-user bearer token to an identity.
    ///
    /// Credentials the provider refuses (expired, revoked, unknown user) must
    /// come back as [`AuthError::Rejected`]; anything that prevents an answer
    /// at all is [`AuthError::Unavailable`].
    async fn verify(&self, token: &str) -> Result<AuthenticatedIdentity, AuthError>;

    /// Deletes the identity record. Runs with administrative privilege.
    ///
    /// An identity the provider no longer knows must be reported as
    /// [`IdentityNotFound`](crate::errors::IdentityNotFound).
    async fn remove(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Full keys of every object under `prefix`, across all pages.
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;

    async fn remove(&self, bucket: &str, keys: &[String]) -> Result<()>;
}

#[async_trait]
pub trait TableStore: Send + Sync {
    /// Deletes every row of `table` owned by `owner`, returning the row count.
    async fn delete_by_owner(&self, table: &str, owner: Uuid) -> Result<usize>;
}
