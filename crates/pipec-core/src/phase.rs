//! Pipeline phases

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Phase of a pipeline run
///
/// `Tokenizing`, `Parsing`, `TypeChecking` and `Generating` are the four *stages*,
/// each backed by one remote call. The remaining phases have no call attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    Idle,
    Tokenizing,
    Parsing,
    TypeChecking,
    Generating,
    Completed,
    Failed,
}

impl PipelinePhase {
    /// The four stages, in execution order
    pub const STAGES: [PipelinePhase; 4] = [
        PipelinePhase::Tokenizing,
        PipelinePhase::Parsing,
        PipelinePhase::TypeChecking,
        PipelinePhase::Generating,
    ];

    /// Whether a remote call belongs to this phase
    pub fn is_stage(self) -> bool {
        self.stage_index().is_some()
    }

    /// Whether the run has ended
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelinePhase::Completed | PipelinePhase::Failed)
    }

    /// Position of the stage in [`PipelinePhase::STAGES`]
    pub fn stage_index(self) -> Option<usize> {
        match self {
            PipelinePhase::Tokenizing => Some(0),
            PipelinePhase::Parsing => Some(1),
            PipelinePhase::TypeChecking => Some(2),
            PipelinePhase::Generating => Some(3),
            _ => None,
        }
    }

    /// Phase entered when this stage completes successfully
    pub fn next(self) -> Option<PipelinePhase> {
        match self {
            PipelinePhase::Idle => Some(PipelinePhase::Tokenizing),
            PipelinePhase::Tokenizing => Some(PipelinePhase::Parsing),
            PipelinePhase::Parsing => Some(PipelinePhase::TypeChecking),
            PipelinePhase::TypeChecking => Some(PipelinePhase::Generating),
            PipelinePhase::Generating => Some(PipelinePhase::Completed),
            PipelinePhase::Completed | PipelinePhase::Failed => None,
        }
    }

    /// Compilation Service endpoint serving this stage
    pub fn endpoint(self) -> Option<&'static str> {
        match self {
            PipelinePhase::Tokenizing => Some("tokenize"),
            PipelinePhase::Parsing => Some("parse"),
            PipelinePhase::TypeChecking => Some("typecheck"),
            PipelinePhase::Generating => Some("generate"),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PipelinePhase::Idle => "idle",
            PipelinePhase::Tokenizing => "tokenizing",
            PipelinePhase::Parsing => "parsing",
            PipelinePhase::TypeChecking => "type_checking",
            PipelinePhase::Generating => "generating",
            PipelinePhase::Completed => "completed",
            PipelinePhase::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown phase name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown pipeline phase: {0}")]
pub struct ParsePhaseError(pub String);

impl FromStr for PipelinePhase {
    type Err = ParsePhaseError;

    /// Accepts phase names as well as the endpoint names of the stages
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "idle" => Ok(PipelinePhase::Idle),
            "tokenizing" | "tokenize" => Ok(PipelinePhase::Tokenizing),
            "parsing" | "parse" => Ok(PipelinePhase::Parsing),
            "type_checking" | "typechecking" | "typecheck" => Ok(PipelinePhase::TypeChecking),
            "generating" | "generate" => Ok(PipelinePhase::Generating),
            "completed" => Ok(PipelinePhase::Completed),
            "failed" => Ok(PipelinePhase::Failed),
            _ => Err(ParsePhaseError(s.to_string())),
        }
    }
}

/// Status of one stage checkpoint in the progress indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointStatus {
    /// Not reached yet
    Pending,
    /// Call in flight
    Active,
    /// Result stored
    Done,
    /// The run failed here
    Failed,
}
