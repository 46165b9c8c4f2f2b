//! Builder pattern for Orchestrator

use crate::config::OrchestratorConfig;
use crate::error::{Result, SdkError};
use crate::orchestrator::Orchestrator;
use pipec_client::config::duration_to_millis;
use pipec_client::{CompilationService, HttpCompilationService, ServiceConfig};
use std::sync::Arc;
use std::time::Duration;

/// Builder for Orchestrator
///
/// # Example
///
/// ```rust,ignore
/// use pipec_sdk::OrchestratorBuilder;
///
/// // HTTP Compilation Service
/// let orchestrator = OrchestratorBuilder::new()
///     .with_base_url("http://localhost:5000")
///     .with_call_timeout(Duration::from_secs(10))
///     .build()?;
///
/// // Any other implementation (e.g. a mock in tests)
/// let orchestrator = OrchestratorBuilder::new()
///     .with_service(Arc::new(MockCompilationService::new()))
///     .build()?;
/// ```
pub struct OrchestratorBuilder {
    config: OrchestratorConfig,
    service: Option<Arc<dyn CompilationService>>,
}

impl OrchestratorBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: OrchestratorConfig::new(),
            service: None,
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the HTTP service configuration
    pub fn with_service_config(mut self, service: ServiceConfig) -> Self {
        self.config.service = service;
        self
    }

    /// Set the HTTP service base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.service.base_url = base_url.into();
        self
    }

    /// Set the per-call timeout
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.config.call_timeout_ms = duration_to_millis(timeout);
        self
    }

    /// Use a specific service implementation instead of the HTTP client
    pub fn with_service(mut self, service: Arc<dyn CompilationService>) -> Self {
        self.service = Some(service);
        self
    }

    /// Build the orchestrator
    pub fn build(self) -> Result<Orchestrator> {
        if self.config.call_timeout_ms == 0 {
            return Err(SdkError::ConfigError(
                "call timeout must be greater than zero".to_string(),
            ));
        }

        let service: Arc<dyn CompilationService> = match self.service {
            Some(service) => service,
            None => Arc::new(HttpCompilationService::from_config(&self.config.service)?),
        };

        tracing::info!(
            "Building orchestrator with {} service, call timeout {}ms",
            service.name(),
            self.config.call_timeout_ms
        );

        Ok(Orchestrator::new(service, self.config.call_timeout()))
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
