//! Artifacts exchanged with the Compilation Service
//!
//! Tokens, AST nodes and type errors are opaque JSON values: the orchestrator
//! stores and forwards them without looking inside.

use crate::error::{PipelineError, Result};
use crate::phase::PipelinePhase;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// User-supplied source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Source(String);

impl Source {
    /// Validate source text; empty and whitespace-only text is rejected
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(PipelineError::InvalidInput(
                "source must not be empty".to_string(),
            ));
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Source {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A token produced by the tokenize call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(pub Value);

/// An AST node produced by the parse call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AstNode(pub Value);

/// A problem reported by the typecheck call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeError(pub Value);

impl TypeError {
    /// Human-readable message
    ///
    /// Plain strings are their own message; objects contribute their `message` field.
    pub fn message(&self) -> Option<&str> {
        match &self.0 {
            Value::String(s) => Some(s),
            Value::Object(map) => map.get("message").and_then(Value::as_str),
            _ => None,
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => f.write_str(message),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Assembly text produced by the generate call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneratedCode(pub String);

impl GeneratedCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GeneratedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GeneratedCode {
    fn from(s: &str) -> Self {
        GeneratedCode(s.to_string())
    }
}

/// Result retained for a completed stage
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum PhaseResult {
    Tokens(Vec<Token>),
    Ast(Vec<AstNode>),
    Errors(Vec<TypeError>),
    Code(GeneratedCode),
}

impl PhaseResult {
    /// Stage that produced this result
    pub fn phase(&self) -> PipelinePhase {
        match self {
            PhaseResult::Tokens(_) => PipelinePhase::Tokenizing,
            PhaseResult::Ast(_) => PipelinePhase::Parsing,
            PhaseResult::Errors(_) => PipelinePhase::TypeChecking,
            PhaseResult::Code(_) => PipelinePhase::Generating,
        }
    }

    /// Raw payload as the service returned it
    pub fn payload(&self) -> Value {
        match self {
            PhaseResult::Tokens(tokens) => {
                Value::Array(tokens.iter().map(|t| t.0.clone()).collect())
            }
            PhaseResult::Ast(ast) => Value::Array(ast.iter().map(|n| n.0.clone()).collect()),
            PhaseResult::Errors(errors) => {
                Value::Array(errors.iter().map(|e| e.0.clone()).collect())
            }
            PhaseResult::Code(code) => Value::String(code.0.clone()),
        }
    }
}
