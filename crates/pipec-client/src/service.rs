//! Compilation Service interface

use crate::error::Result;
use async_trait::async_trait;
use pipec_core::{AstNode, GeneratedCode, Source, Token, TypeError};

/// The four operations of the Compilation Service
///
/// Each call is stateless: everything it needs travels in its arguments.
#[async_trait]
pub trait CompilationService: Send + Sync {
    /// Split source text into tokens
    async fn tokenize(&self, source: &Source) -> Result<Vec<Token>>;

    /// Build AST nodes from tokens
    async fn parse(&self, tokens: &[Token]) -> Result<Vec<AstNode>>;

    /// Report type errors; an empty list means the program is well typed
    async fn typecheck(&self, ast: &[AstNode]) -> Result<Vec<TypeError>>;

    /// Produce assembly for a well typed AST
    async fn generate(&self, ast: &[AstNode]) -> Result<GeneratedCode>;

    /// Get the name of this service implementation
    fn name(&self) -> &str;
}
