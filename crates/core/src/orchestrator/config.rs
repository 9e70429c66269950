//! Orchestrator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the pipeline orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// TTL in seconds for every status cache entry the orchestrator
    /// writes (active markers, progress, done/error payloads). Entries
    /// that outlive their usefulness expire on their own.
    #[serde(default = "default_status_ttl")]
    pub status_ttl_secs: u64,
}

fn default_status_ttl() -> u64 {
    3600 // 1 hour
}

impl OrchestratorConfig {
    pub fn status_ttl(&self) -> Duration {
        Duration::from_secs(self.status_ttl_secs)
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            status_ttl_secs: default_status_ttl(),
        }
    }
}
