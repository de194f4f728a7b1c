//! In-memory capabilities for exercising the deletion workflow.
//!
//! Every call is appended to a shared journal so tests can assert both which
//! remote calls happened and in what order.

use crate::{
    capabilities::{IdentityProvider, ObjectStore, TableStore},
    errors::{AuthError, IdentityNotFound},
    models::{AuthenticatedIdentity, CleanupTarget},
    services::orchestrator::{DeletionOrchestrator, OrchestratorSettings},
};
use anyhow::Result;
use async_trait::async_trait;
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};
use uuid::Uuid;

pub type Journal = Arc<Mutex<Vec<String>>>;

fn record(journal: &Journal, entry: String) {
    journal.lock().unwrap().push(entry);
}

#[derive(Default)]
pub struct FakeIdentityProvider {
    journal: Journal,
    tokens: Mutex<HashMap<String, Uuid>>,
    removed: Mutex<HashSet<Uuid>>,
    fail_remove: Mutex<bool>,
    unavailable: Mutex<bool>,
}

impl FakeIdentityProvider {
    pub fn register(&self, token: &str, id: Uuid) {
        self.tokens.lock().unwrap().insert(token.to_string(), id);
    }

    pub fn fail_remove(&self) {
        *self.fail_remove.lock().unwrap() = true;
    }

    pub fn go_offline(&self) {
        *self.unavailable.lock().unwrap() = true;
    }

    pub fn is_removed(&self, id: Uuid) -> bool {
        self.removed.lock().unwrap().contains(&id)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn verify(&self, token: &str) -> Result<AuthenticatedIdentity, AuthError> {
        record(&self.journal, format!("verify:{}", token));

        if *self.unavailable.lock().unwrap() {
            return Err(AuthError::Unavailable(anyhow::anyhow!("connection refused")));
        }

        let id = self
            .tokens
            .lock()
            .unwrap()
            .get(token)
            .copied()
            .ok_or_else(|| AuthError::Rejected("unknown token".into()))?;

        if self.is_removed(id) {
            return Err(AuthError::Rejected("user not found".into()));
        }

        Ok(AuthenticatedIdentity { id })
    }

    async fn remove(&self, id: Uuid) -> Result<()> {
        record(&self.journal, format!("remove:{}", id));

        if *self.fail_remove.lock().unwrap() {
            anyhow::bail!("admin API returned 500");
        }
        if !self.removed.lock().unwrap().insert(id) {
            return Err(IdentityNotFound(id).into());
        }

        Ok(())
    }
}

#[derive(Default)]
pub struct FakeObjectStore {
    journal: Journal,
    buckets: Mutex<HashMap<String, Vec<String>>>,
    failing: Mutex<HashSet<String>>,
}

impl FakeObjectStore {
    pub fn put(&self, bucket: &str, key: &str) {
        self.buckets
            .lock()
            .unwrap()
            .entry(bucket.to_string())
            .or_default()
            .push(key.to_string());
    }

    pub fn fail_bucket(&self, bucket: &str) {
        self.failing.lock().unwrap().insert(bucket.to_string());
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .lock()
            .unwrap()
            .get(bucket)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        record(&self.journal, format!("list:{}:{}", bucket, prefix));

        if self.failing.lock().unwrap().contains(bucket) {
            anyhow::bail!("bucket {} unavailable", bucket);
        }

        Ok(self
            .keys(bucket)
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect())
    }

    async fn remove(&self, bucket: &str, keys: &[String]) -> Result<()> {
        record(&self.journal, format!("remove_objects:{}:{}", bucket, keys.len()));

        if let Some(stored) = self.buckets.lock().unwrap().get_mut(bucket) {
            stored.retain(|key| !keys.contains(key));
        }

        Ok(())
    }
}

#[derive(Default)]
pub struct FakeTableStore {
    journal: Journal,
    rows: Mutex<HashMap<String, Vec<Uuid>>>,
    failing: Mutex<HashSet<String>>,
    delays: Mutex<HashMap<String, Duration>>,
}

impl FakeTableStore {
    pub fn insert(&self, table: &str, owner: Uuid, count: usize) {
        self.rows
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .extend(std::iter::repeat(owner).take(count));
    }

    pub fn fail_table(&self, table: &str) {
        self.failing.lock().unwrap().insert(table.to_string());
    }

    pub fn delay_table(&self, table: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(table.to_string(), delay);
    }

    pub fn count(&self, table: &str, owner: Uuid) -> usize {
        self.rows
            .lock()
            .unwrap()
            .get(table)
            .map(|rows| rows.iter().filter(|id| **id == owner).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl TableStore for FakeTableStore {
    async fn delete_by_owner(&self, table: &str, owner: Uuid) -> Result<usize> {
        let delay = self.delays.lock().unwrap().get(table).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        record(&self.journal, format!("delete:{}:{}", table, owner));

        if self.failing.lock().unwrap().contains(table) {
            anyhow::bail!("relation \"{}\" is locked", table);
        }

        let mut rows = self.rows.lock().unwrap();
        let stored = rows.entry(table.to_string()).or_default();
        let before = stored.len();
        stored.retain(|id| *id != owner);

        Ok(before - stored.len())
    }
}

/// The three fakes wired to one journal.
pub struct Harness {
    pub identity: Arc<FakeIdentityProvider>,
    pub objects: Arc<FakeObjectStore>,
    pub tables: Arc<FakeTableStore>,
    pub journal: Journal,
}

impl Harness {
    pub fn new() -> Self {
        let journal = Journal::default();

        Self {
            identity: Arc::new(FakeIdentityProvider {
                journal: journal.clone(),
                ..Default::default()
            }),
            objects: Arc::new(FakeObjectStore {
                journal: journal.clone(),
                ..Default::default()
            }),
            tables: Arc::new(FakeTableStore {
                journal: journal.clone(),
                ..Default::default()
            }),
            journal,
        }
    }

    pub fn orchestrator(&self, settings: OrchestratorSettings) -> DeletionOrchestrator {
        DeletionOrchestrator::from_capabilities(
            self.identity.clone(),
            self.objects.clone(),
            self.tables.clone(),
            default_targets(),
            settings,
        )
    }

    pub fn entries(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }
}

pub fn default_targets() -> Vec<CleanupTarget> {
    vec![
        CleanupTarget::storage("avatars").unwrap(),
        CleanupTarget::storage("trade-screenshots").unwrap(),
        CleanupTarget::table("trades").unwrap(),
        CleanupTarget::table("custom_currency_pairs").unwrap(),
        CleanupTarget::table("profiles").unwrap(),
    ]
}
