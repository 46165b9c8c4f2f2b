//! pipec Client - Compilation Service access
//!
//! The Compilation Service offers four stateless operations: tokenize, parse,
//! typecheck and generate. This crate provides:
//! - [`CompilationService`]: the async interface the orchestrator drives
//! - [`HttpCompilationService`]: JSON-over-HTTP implementation
//! - [`MockCompilationService`]: scripted implementation for tests and demos

pub mod config;
pub mod error;
pub mod http;
pub mod mock;
pub mod service;
pub mod wire;

// Re-export core types
pub use config::ServiceConfig;
pub use error::{ClientError, Result};
pub use http::HttpCompilationService;
pub use mock::{MockCompilationService, MockGate};
pub use service::CompilationService;
