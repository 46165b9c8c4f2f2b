//! Error taxonomy for pipeline runs

use crate::artifact::TypeError;
use crate::phase::PipelinePhase;
use serde::Serialize;
use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Why a run ended in `Failed`
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhaseFailure {
    /// Network, server or timeout failure of a stage call
    #[error("Transport error during {phase}: {message}")]
    Transport {
        phase: PipelinePhase,
        message: String,
    },

    /// The typecheck call reported one or more type errors
    #[error("Type check failed with {} error(s)", errors.len())]
    TypeCheck { errors: Vec<TypeError> },
}

impl PhaseFailure {
    /// Stage the run failed in
    pub fn phase(&self) -> PipelinePhase {
        match self {
            PhaseFailure::Transport { phase, .. } => *phase,
            PhaseFailure::TypeCheck { .. } => PipelinePhase::TypeChecking,
        }
    }

    pub fn is_type_check(&self) -> bool {
        matches!(self, PhaseFailure::TypeCheck { .. })
    }
}

/// Pipeline error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Local precondition violated; no call was issued
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A stage call is outstanding
    #[error("Pipeline busy: {phase} call in flight")]
    Busy { phase: PipelinePhase },

    /// The run ended in `Failed`
    #[error(transparent)]
    Failed(#[from] PhaseFailure),

    /// State machine misuse or a lost driver task
    #[error("Internal pipeline error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Stage associated with the error, if any
    pub fn phase(&self) -> Option<PipelinePhase> {
        match self {
            PipelineError::Busy { phase } => Some(*phase),
            PipelineError::Failed(failure) => Some(failure.phase()),
            _ => None,
        }
    }

    /// Type errors carried by a `TypeCheckFailure`
    pub fn type_errors(&self) -> Option<&[TypeError]> {
        match self {
            PipelineError::Failed(PhaseFailure::TypeCheck { errors }) => Some(errors),
            _ => None,
        }
    }
}
