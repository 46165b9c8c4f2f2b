//! pipec Core - Core types for the compilation pipeline orchestrator
//!
//! This crate provides the fundamental types shared by the client, SDK and server:
//! - Pipeline phases and checkpoint status
//! - Opaque artifacts exchanged with the Compilation Service
//! - The tagged pipeline state machine
//! - Error taxonomy

pub mod artifact;
pub mod error;
pub mod phase;
pub mod state;

// Re-export commonly used types
pub use artifact::{AstNode, GeneratedCode, PhaseResult, Source, Token, TypeError};
pub use error::{PhaseFailure, PipelineError, Result};
pub use phase::{CheckpointStatus, ParsePhaseError, PipelinePhase};
pub use state::PipelineState;
