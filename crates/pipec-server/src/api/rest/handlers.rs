//! API endpoint handlers

use super::extractors::JsonExtractor;
use super::types::*;
use crate::error::ServerError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use pipec_sdk::{PipelinePhase, PipelineSnapshot};
use tracing::{info, warn};

/// Health check endpoint
pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Begin a run; the stages continue in the background
pub(super) async fn start_pipeline(
    State(state): State<AppState>,
    JsonExtractor(payload): JsonExtractor<StartRequestPayload>,
) -> Result<(StatusCode, Json<StartResponsePayload>), ServerError> {
    let handle = state
        .orchestrator
        .start(payload.source)
        .await
        .map_err(|e| {
            warn!("Start rejected: {}", e);
            ServerError::from(e)
        })?;

    info!("Accepted pipeline run {}", handle.run_id());

    Ok((
        StatusCode::ACCEPTED,
        Json(StartResponsePayload {
            run_id: handle.run_id(),
            phase: PipelinePhase::Tokenizing,
        }),
    ))
}

pub(super) async fn reset_pipeline(
    State(state): State<AppState>,
) -> Result<Json<ResetResponse>, ServerError> {
    state.orchestrator.reset().await?;

    Ok(Json(ResetResponse {
        phase: PipelinePhase::Idle,
    }))
}

/// Progress indicator: current phase plus one checkpoint per stage
pub(super) async fn pipeline_snapshot(State(state): State<AppState>) -> Json<PipelineSnapshot> {
    Json(state.orchestrator.snapshot().await)
}

/// Raw result or failure detail for one stage
pub(super) async fn phase_detail(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<PhaseDetailResponse>, ServerError> {
    let phase: PipelinePhase = name
        .parse()
        .map_err(|e| ServerError::NotFound(format!("{}", e)))?;

    let detail = state
        .orchestrator
        .stage_detail(phase)
        .await
        .ok_or_else(|| ServerError::NotFound(format!("'{}' is not a pipeline stage", name)))?;

    Ok(Json(PhaseDetailResponse {
        phase,
        endpoint: detail.checkpoint.endpoint,
        status: detail.checkpoint.status,
        result: detail.result.map(|result| result.payload()),
        failure: detail.failure,
    }))
}
