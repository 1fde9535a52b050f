use std::sync::Arc;

use crate::config::AppConfig;
use crate::design::DesignEngine;
use crate::generation::Orchestrator;
use crate::llm::LlmGateway;
use crate::store::DashboardStore;

/// Shared application state handed to every route.
pub struct AppState {
    pub config: AppConfig,
    pub orchestrator: Arc<Orchestrator>,
    pub design: Arc<DesignEngine>,
    pub store: Arc<dyn DashboardStore>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        llm: Arc<dyn LlmGateway>,
        store: Arc<dyn DashboardStore>,
    ) -> Self {
        Self {
            config,
            orchestrator: Arc::new(Orchestrator::new(Arc::clone(&llm), Arc::clone(&store))),
            design: Arc::new(DesignEngine::new(llm, Arc::clone(&store))),
            store,
        }
    }
}
