use crate::services::orchestrator::DeletionOrchestrator;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<DeletionOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: DeletionOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}
