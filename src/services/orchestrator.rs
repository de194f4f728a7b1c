use crate::{
    capabilities::{IdentityProvider, ObjectStore, TableStore},
    config::Config,
    errors::{AuthError, RemovalError},
    models::{
        AuthenticatedIdentity, CleanupOutcome, CleanupTarget, DeletionOutcome, DeletionRequest,
        DeletionState,
    },
    services::{
        auth_verifier::AuthVerifier, identity_remover::IdentityRemover,
        record_cleaner::RecordCleaner, storage_cleaner::StorageCleaner,
    },
};
use futures::{
    future::{BoxFuture, FutureExt},
    stream::{self, StreamExt},
};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn, Instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Cleanup steps allowed in flight at once.
    pub concurrency: usize,
    /// Upper bound for a single cleanup step. `None` waits indefinitely.
    pub step_timeout: Option<Duration>,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            concurrency: 4,
            step_timeout: None,
        }
    }
}

impl From<&Config> for OrchestratorSettings {
    fn from(config: &Config) -> Self {
        Self {
            concurrency: config.cleanup_concurrency,
            step_timeout: config.cleanup_step_timeout(),
        }
    }
}

/// Runs account deletion: authenticate, clean every target, remove the identity.
///
/// Cleanup is best effort and never blocks identity removal. Identity removal
/// is all-or-nothing and decides the overall result.
pub struct DeletionOrchestrator {
    verifier: AuthVerifier,
    storage: StorageCleaner,
    records: RecordCleaner,
    remover: IdentityRemover,
    targets: Vec<CleanupTarget>,
    settings: OrchestratorSettings,
}

impl DeletionOrchestrator {
    pub fn new(
        verifier: AuthVerifier,
        storage: StorageCleaner,
        records: RecordCleaner,
        remover: IdentityRemover,
        targets: Vec<CleanupTarget>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            verifier,
            storage,
            records,
            remover,
            targets,
            settings,
        }
    }

    pub fn from_capabilities(
        identity: Arc<dyn IdentityProvider>,
        objects: Arc<dyn ObjectStore>,
        tables: Arc<dyn TableStore>,
        targets: Vec<CleanupTarget>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self::new(
            AuthVerifier::new(identity.clone()),
            StorageCleaner::new(objects),
            RecordCleaner::new(tables),
            IdentityRemover::new(identity),
            targets,
            settings,
        )
    }

    pub fn targets(&self) -> &[CleanupTarget] {
        &self.targets
    }

    /// Runs one deletion request to a terminal state.
    ///
    /// `Err` is the `AuthRejected` terminal. Normally nothing was cleaned or
    /// removed; the exception is a request that loses a race with another
    /// deletion of the same identity, whose cleanup already ran.
    /// `Ok` carries an outcome in either `Completed` or `DeletionFailed`.
    pub async fn run(&self, request: &DeletionRequest) -> Result<DeletionOutcome, AuthError> {
        let span = tracing::info_span!("account_deletion", identity = tracing::field::Empty);
        self.run_workflow(request).instrument(span).await
    }

    async fn run_workflow(&self, request: &DeletionRequest) -> Result<DeletionOutcome, AuthError> {
        transition(DeletionState::Init, DeletionState::Authenticating);

        let identity = match self.verifier.verify(request).await {
            Ok(identity) => identity,
            Err(err) => {
                transition(DeletionState::Authenticating, DeletionState::AuthRejected);
                return Err(err);
            }
        };
        tracing::Span::current().record("identity", tracing::field::display(identity.id));

        transition(
            DeletionState::Authenticating,
            DeletionState::CleaningResources,
        );
        let cleanup_outcomes = self.clean_all(&identity).await;

        transition(
            DeletionState::CleaningResources,
            DeletionState::RemovingIdentity,
        );
        let fatal = match self.remover.remove(&identity).await {
            Ok(()) => None,
            Err(RemovalError::AlreadyRemoved(id)) => {
                warn!(%id, "Identity was removed by a concurrent request");
                transition(DeletionState::RemovingIdentity, DeletionState::AuthRejected);
                return Err(AuthError::Rejected(format!("identity {} already removed", id)));
            }
            Err(RemovalError::Fatal(err)) => Some(err),
        };

        let outcome = DeletionOutcome {
            identity,
            cleanup_outcomes,
            identity_removed: fatal.is_none(),
            fatal,
        };
        transition(DeletionState::RemovingIdentity, outcome.state());

        let failed = outcome.failed_cleanups().count();
        if failed > 0 {
            warn!(
                failed,
                total = outcome.cleanup_outcomes.len(),
                "Cleanup left residual data behind"
            );
        }
        info!(state = %outcome.state(), "Account deletion finished");

        Ok(outcome)
    }

    /// Attempts every target. Outcomes come back in declaration order.
    async fn clean_all(&self, identity: &AuthenticatedIdentity) -> Vec<CleanupOutcome> {
        let steps: Vec<BoxFuture<'_, CleanupOutcome>> = self
            .targets
            .iter()
            .map(|target| self.clean_one(target, identity).boxed())
            .collect();

        stream::iter(steps)
            .buffered(self.settings.concurrency.max(1))
            .collect()
            .await
    }

    async fn clean_one(
        &self,
        target: &CleanupTarget,
        identity: &AuthenticatedIdentity,
    ) -> CleanupOutcome {
        let step = async {
            match target {
                CleanupTarget::Storage { bucket } => self.storage.clean(bucket, identity).await,
                CleanupTarget::Table { table } => self.records.clean(table, identity).await,
            }
        };

        let Some(limit) = self.settings.step_timeout else {
            return step.await;
        };

        match tokio::time::timeout(limit, step).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(%target, ?limit, "Cleanup step timed out");
                CleanupOutcome::failed(target.clone(), format!("timed out after {:?}", limit))
            }
        }
    }
}

fn transition(from: DeletionState, to: DeletionState) {
    debug!(%from, %to, "Deletion state transition");
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
