//! REST API type definitions
//!
//! Request and response types for the REST API endpoints.

use pipec_sdk::{CheckpointStatus, Orchestrator, PhaseFailure, PipelinePhase};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Start request payload
#[derive(Debug, Deserialize)]
pub struct StartRequestPayload {
    /// Program text to compile
    pub source: String,
}

/// Start response payload
#[derive(Debug, Serialize)]
pub struct StartResponsePayload {
    pub run_id: Uuid,
    pub phase: PipelinePhase,
}

/// Reset response payload
#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub phase: PipelinePhase,
}

/// Detail view of one stage: its raw result or the failure that stopped it
#[derive(Debug, Serialize)]
pub struct PhaseDetailResponse {
    pub phase: PipelinePhase,
    pub endpoint: &'static str,
    pub status: CheckpointStatus,

    /// Raw tokens, AST, type errors or generated code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<PhaseFailure>,
}
