//! Orchestrator - drives a source text through the four compilation stages
//!
//! # Architecture
//!
//! The module is organized into:
//! - `types`: progress views (PipelineSnapshot, Checkpoint) and RunHandle
//! - `engine`: Orchestrator implementation and the per-run driver task
//! - `tests`: Unit tests (test-only)

mod engine;
mod types;

// Re-export public types
pub use engine::Orchestrator;
pub use types::{Checkpoint, PipelineSnapshot, RunHandle, StageDetail};

// Tests module (only compiled in test mode)
#[cfg(test)]
mod tests;
