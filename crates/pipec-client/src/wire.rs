//! JSON bodies exchanged with the Compilation Service

use pipec_core::{AstNode, GeneratedCode, Token, TypeError};
use serde::{Deserialize, Serialize};

/// `POST /tokenize`
#[derive(Debug, Serialize)]
pub struct TokenizeRequest<'a> {
    pub source: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TokenizeResponse {
    pub tokens: Vec<Token>,
}

/// `POST /parse`
#[derive(Debug, Serialize)]
pub struct ParseRequest<'a> {
    pub tokens: &'a [Token],
}

#[derive(Debug, Deserialize)]
pub struct ParseResponse {
    pub ast: Vec<AstNode>,
}

/// `POST /typecheck` and `POST /generate`
#[derive(Debug, Serialize)]
pub struct AstRequest<'a> {
    pub ast: &'a [AstNode],
}

#[derive(Debug, Deserialize)]
pub struct TypeCheckResponse {
    pub errors: Vec<TypeError>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    pub nasm_code: GeneratedCode,
}

/// Body the service sends alongside 4xx/5xx statuses
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
