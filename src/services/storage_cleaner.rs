use crate::{
    capabilities::ObjectStore,
    errors::CleanupError,
    models::{AuthenticatedIdentity, CleanupOutcome, CleanupTarget},
    utils::s3_utils,
};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Object store backed by an S3-compatible endpoint.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        s3_utils::list_keys_with_prefix(&self.client, bucket, prefix).await
    }

    async fn remove(&self, bucket: &str, keys: &[String]) -> Result<()> {
        s3_utils::delete_keys(&self.client, bucket, keys).await
    }
}

#[derive(Clone)]
pub struct StorageCleaner {
    store: Arc<dyn ObjectStore>,
}

impl StorageCleaner {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Removes every object under `{identity}/` in `bucket`.
    ///
    /// Never fails: errors are captured in the returned outcome. An empty
    /// namespace is a successful no-op, so repeated runs are safe.
    pub async fn clean(&self, bucket: &str, identity: &AuthenticatedIdentity) -> CleanupOutcome {
        let target = CleanupTarget::Storage {
            bucket: bucket.to_string(),
        };

        match self.remove_namespace(bucket, identity).await {
            Ok(removed) => {
                debug!(bucket, identity = %identity, removed, "Storage namespace cleaned");
                CleanupOutcome::succeeded(target)
            }
            Err(source) => {
                let err = CleanupError { target, source };
                warn!(identity = %identity, "{}", err);
                CleanupOutcome::failed(err.target, format!("{:#}", err.source))
            }
        }
    }

    async fn remove_namespace(&self, bucket: &str, identity: &AuthenticatedIdentity) -> Result<usize> {
        let keys = self.store.list(bucket, &identity.storage_prefix()).await?;
        if keys.is_empty() {
            return Ok(0);
        }

        self.store.remove(bucket, &keys).await?;
        Ok(keys.len())
    }
}

#[cfg(test)]
#[path = "storage_cleaner_tests.rs"]
mod tests;
