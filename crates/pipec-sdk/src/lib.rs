//! pipec SDK
//!
//! High-level API for running source text through the Compilation Service's
//! tokenize, parse, typecheck and generate stages.

pub mod builder;
pub mod config;
pub mod error;
pub mod orchestrator;

// Re-export main types
pub use builder::OrchestratorBuilder;
pub use config::OrchestratorConfig;
pub use error::{Result, SdkError};
pub use orchestrator::{Checkpoint, Orchestrator, PipelineSnapshot, RunHandle, StageDetail};

// Re-export commonly used types from dependencies
pub use pipec_client::{CompilationService, HttpCompilationService, ServiceConfig};
pub use pipec_core::{
    CheckpointStatus, GeneratedCode, PhaseFailure, PhaseResult, PipelineError, PipelinePhase,
};
