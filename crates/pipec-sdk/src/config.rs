//! Configuration types for the Orchestrator

use pipec_client::ServiceConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Orchestrator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Upper bound for each stage call in milliseconds; expiry fails the stage
    pub call_timeout_ms: u64,

    /// Compilation Service connection
    pub service: ServiceConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: 30_000,
            service: ServiceConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Create a new orchestrator configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}
