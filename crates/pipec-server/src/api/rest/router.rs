//! Router creation and configuration

use super::handlers::*;
use super::types::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use pipec_sdk::Orchestrator;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create REST API router
pub fn create_router(orchestrator: Orchestrator) -> Router {
    let state = AppState { orchestrator };

    Router::new()
        .route("/health", get(health))
        .route("/v1/pipeline", get(pipeline_snapshot))
        .route("/v1/pipeline/start", post(start_pipeline))
        .route("/v1/pipeline/reset", post(reset_pipeline))
        .route("/v1/pipeline/phases/:phase", get(phase_detail))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
