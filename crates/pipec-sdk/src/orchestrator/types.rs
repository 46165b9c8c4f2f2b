//! Progress views and run handles

use chrono::{DateTime, Utc};
use pipec_core::{
    CheckpointStatus, GeneratedCode, PhaseFailure, PhaseResult, PipelineError, PipelinePhase,
    PipelineState, Result,
};
use serde::Serialize;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// One stage of the progress indicator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Checkpoint {
    pub phase: PipelinePhase,
    pub endpoint: &'static str,
    pub status: CheckpointStatus,
}

impl Checkpoint {
    fn capture(state: &PipelineState, stage: PipelinePhase) -> Option<Self> {
        Some(Self {
            phase: stage,
            endpoint: stage.endpoint()?,
            status: state.checkpoint(stage),
        })
    }
}

/// One stage with its retained result and the failure that stopped it, if any
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageDetail {
    pub checkpoint: Checkpoint,
    pub result: Option<PhaseResult>,
    pub failure: Option<PhaseFailure>,
}

impl StageDetail {
    pub(crate) fn capture(state: &PipelineState, stage: PipelinePhase) -> Option<Self> {
        Some(Self {
            checkpoint: Checkpoint::capture(state, stage)?,
            result: state.result_for(stage),
            failure: state.failure().filter(|f| f.phase() == stage).cloned(),
        })
    }
}

/// Point-in-time view of the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSnapshot {
    /// Current run, absent while idle
    pub run_id: Option<Uuid>,
    pub phase: PipelinePhase,
    /// The four stages in execution order
    pub checkpoints: Vec<Checkpoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<PhaseFailure>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl PipelineSnapshot {
    pub(crate) fn capture(
        state: &PipelineState,
        run_id: Option<Uuid>,
        started_at: Option<DateTime<Utc>>,
        finished_at: Option<DateTime<Utc>>,
    ) -> Self {
        let checkpoints = PipelinePhase::STAGES
            .iter()
            .filter_map(|stage| Checkpoint::capture(state, *stage))
            .collect();

        Self {
            run_id,
            phase: state.phase(),
            checkpoints,
            failure: state.failure().cloned(),
            started_at,
            finished_at,
        }
    }

    /// Checkpoint for `phase`, if it is a stage
    pub fn checkpoint(&self, phase: PipelinePhase) -> Option<&Checkpoint> {
        self.checkpoints.iter().find(|c| c.phase == phase)
    }

    /// Wall-clock duration of a finished run
    pub fn elapsed_ms(&self) -> Option<i64> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
            _ => None,
        }
    }
}

/// Handle to a started run
///
/// Dropping the handle does not stop the run.
pub struct RunHandle {
    pub(crate) run_id: Uuid,
    pub(crate) task: JoinHandle<Result<GeneratedCode>>,
}

impl RunHandle {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Wait for the run to finish
    pub async fn wait(self) -> Result<GeneratedCode> {
        self.task
            .await
            .map_err(|e| PipelineError::Internal(format!("pipeline task failed: {}", e)))?
    }
}
