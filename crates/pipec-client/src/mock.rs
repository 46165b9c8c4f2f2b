//! Scripted Compilation Service for testing
//!
//! Each endpoint answers with a configured reply. A call can be held open with a
//! [`MockGate`] until the test releases it, which makes "what happens while a
//! call is outstanding" observable.

use crate::error::{ClientError, Result};
use crate::service::CompilationService;
use async_trait::async_trait;
use pipec_core::{AstNode, GeneratedCode, PipelinePhase, Source, Token, TypeError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Semaphore;

type Reply<T> = std::result::Result<T, String>;

struct Script {
    tokens: Reply<Vec<Token>>,
    ast: Reply<Vec<AstNode>>,
    errors: Reply<Vec<TypeError>>,
    code: Reply<GeneratedCode>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            tokens: Ok(Vec::new()),
            ast: Ok(Vec::new()),
            errors: Ok(Vec::new()),
            code: Ok(GeneratedCode(String::new())),
        }
    }
}

/// Holds a call open until released
#[derive(Clone)]
pub struct MockGate {
    permits: Arc<Semaphore>,
}

impl MockGate {
    fn new() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(0)),
        }
    }

    /// Let held and future calls through
    pub fn release(&self) {
        self.permits.add_permits(1);
    }

    async fn wait(&self) {
        // The permit goes back on drop so the gate stays open
        let _permit = self.permits.acquire().await;
    }
}

/// Mock Compilation Service
pub struct MockCompilationService {
    name: String,
    script: Mutex<Script>,
    delays: HashMap<PipelinePhase, Duration>,
    gates: Mutex<HashMap<PipelinePhase, MockGate>>,
    calls: Mutex<Vec<PipelinePhase>>,
}

impl MockCompilationService {
    /// Create a mock answering every call with an empty success
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            script: Mutex::new(Script::default()),
            delays: HashMap::new(),
            gates: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Reply to tokenize with `tokens`
    pub fn with_tokens(self, tokens: Vec<Token>) -> Self {
        lock(&self.script).tokens = Ok(tokens);
        self
    }

    /// Reply to parse with `ast`
    pub fn with_ast(self, ast: Vec<AstNode>) -> Self {
        lock(&self.script).ast = Ok(ast);
        self
    }

    /// Reply to typecheck with `errors`
    pub fn with_type_errors(self, errors: Vec<TypeError>) -> Self {
        lock(&self.script).errors = Ok(errors);
        self
    }

    /// Reply to generate with `code`
    pub fn with_code(self, code: impl Into<String>) -> Self {
        lock(&self.script).code = Ok(GeneratedCode(code.into()));
        self
    }

    /// Fail the call for `phase` with `message`
    ///
    /// `phase` must be one of the four stages.
    pub fn with_failure(self, phase: PipelinePhase, message: impl Into<String>) -> Self {
        debug_assert!(phase.is_stage(), "no call is issued during {}", phase);
        let message = message.into();
        {
            let mut script = lock(&self.script);
            match phase {
                PipelinePhase::Tokenizing => script.tokens = Err(message),
                PipelinePhase::Parsing => script.ast = Err(message),
                PipelinePhase::TypeChecking => script.errors = Err(message),
                PipelinePhase::Generating => script.code = Err(message),
                _ => {}
            }
        }
        self
    }

    /// Sleep for `delay` before answering the call for `phase`
    pub fn with_delay(mut self, phase: PipelinePhase, delay: Duration) -> Self {
        self.delays.insert(phase, delay);
        self
    }

    /// Hold calls for `phase` until the returned gate is released
    pub fn hold(&self, phase: PipelinePhase) -> MockGate {
        lock(&self.gates)
            .entry(phase)
            .or_insert_with(MockGate::new)
            .clone()
    }

    /// Issued calls, in order, identified by their stage
    pub fn calls(&self) -> Vec<PipelinePhase> {
        lock(&self.calls).clone()
    }

    /// Number of issued calls for `phase`
    pub fn call_count(&self, phase: PipelinePhase) -> usize {
        lock(&self.calls).iter().filter(|p| **p == phase).count()
    }

    async fn respond<T>(
        &self,
        phase: PipelinePhase,
        pick: impl FnOnce(&Script) -> Reply<T>,
    ) -> Result<T> {
        lock(&self.calls).push(phase);

        let gate = lock(&self.gates).get(&phase).cloned();
        if let Some(gate) = gate {
            gate.wait().await;
        }
        if let Some(delay) = self.delays.get(&phase) {
            tokio::time::sleep(*delay).await;
        }

        let reply = pick(&lock(&self.script));
        reply.map_err(ClientError::Other)
    }
}

impl Default for MockCompilationService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompilationService for MockCompilationService {
    async fn tokenize(&self, _source: &Source) -> Result<Vec<Token>> {
        self.respond(PipelinePhase::Tokenizing, |s| s.tokens.clone())
            .await
    }

    async fn parse(&self, _tokens: &[Token]) -> Result<Vec<AstNode>> {
        self.respond(PipelinePhase::Parsing, |s| s.ast.clone()).await
    }

    async fn typecheck(&self, _ast: &[AstNode]) -> Result<Vec<TypeError>> {
        self.respond(PipelinePhase::TypeChecking, |s| s.errors.clone())
            .await
    }

    async fn generate(&self, _ast: &[AstNode]) -> Result<GeneratedCode> {
        self.respond(PipelinePhase::Generating, |s| s.code.clone())
            .await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
