//! pipec HTTP Server
//!
//! Drives source text through the Compilation Service and exposes pipeline
//! progress over REST.

use anyhow::Result;
use pipec_sdk::OrchestratorBuilder;
use pipec_server::{api, config::ServerConfig};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = ServerConfig::load()?;

    // Initialize tracing
    init_tracing(&config)?;
    info!("Loaded configuration: {:?}", config);

    let orchestrator = OrchestratorBuilder::new()
        .with_config(config.orchestrator.clone())
        .build()?;
    info!(
        "Orchestrator initialized ({} service at {}, call timeout {:?})",
        orchestrator.service_name(),
        config.orchestrator.service.base_url,
        orchestrator.call_timeout()
    );

    let app = api::create_router(orchestrator);

    // Start server
    let addr = config.bind_addr();
    info!("Starting server on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    info!("✓ Server listening on http://{}", addr);
    info!("  Health check: http://{}/health", addr);
    info!("  Start run: POST http://{}/v1/pipeline/start", addr);
    info!("  Progress: http://{}/v1/pipeline", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize tracing subscriber
///
/// `RUST_LOG` wins over the configured level.
fn init_tracing(config: &ServerConfig) -> Result<()> {
    let default_filter = format!(
        "pipec_server={level},pipec_sdk={level},pipec_client={level},tower_http=debug",
        level = config.log_level
    );

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}
