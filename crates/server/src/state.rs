use std::sync::Arc;
use std::time::Duration;

use recap_core::{
    Authenticator, Config, LiveConfig, LiveDeps, PipelineOrchestrator, ProjectStore,
    SanitizedConfig, StatusCache, TaskStore,
};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    projects: Arc<dyn ProjectStore>,
    tasks: Arc<dyn TaskStore>,
    cache: Arc<dyn StatusCache>,
    orchestrator: Arc<PipelineOrchestrator>,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        projects: Arc<dyn ProjectStore>,
        tasks: Arc<dyn TaskStore>,
        cache: Arc<dyn StatusCache>,
        orchestrator: Arc<PipelineOrchestrator>,
    ) -> Self {
        Self {
            config,
            authenticator,
            projects,
            tasks,
            cache,
            orchestrator,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn projects(&self) -> &dyn ProjectStore {
        self.projects.as_ref()
    }

    pub fn tasks(&self) -> &dyn TaskStore {
        self.tasks.as_ref()
    }

    pub fn cache(&self) -> &Arc<dyn StatusCache> {
        &self.cache
    }

    pub fn orchestrator(&self) -> &PipelineOrchestrator {
        &self.orchestrator
    }

    pub fn live_config(&self) -> &LiveConfig {
        &self.config.live
    }

    /// TTL applied to cache markers written by API handlers.
    pub fn status_ttl(&self) -> Duration {
        self.config.orchestrator.status_ttl()
    }

    pub fn live_deps(&self) -> LiveDeps {
        LiveDeps {
            tasks: self.tasks.clone(),
            projects: self.projects.clone(),
            cache: self.cache.clone(),
        }
    }
}
