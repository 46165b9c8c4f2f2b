//! Behavioural tests for the Orchestrator
//!
//! All runs go through `MockCompilationService`, so every issued call is
//! observable and responses can be held open.

use async_trait::async_trait;
use pipec_client::{CompilationService, MockCompilationService};
use pipec_core::{AstNode, GeneratedCode, Source, Token, TypeError};
use pipec_sdk::{
    Orchestrator, OrchestratorBuilder, PhaseFailure, PhaseResult, PipelineError, PipelinePhase,
};
use serde_json::json;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tokio::sync::watch;

fn build(mock: Arc<MockCompilationService>) -> Orchestrator {
    OrchestratorBuilder::new()
        .with_service(mock)
        .with_call_timeout(Duration::from_secs(5))
        .build()
        .expect("orchestrator should build")
}

fn assignment_mock() -> MockCompilationService {
    MockCompilationService::new()
        .with_tokens(vec![
            Token(json!({"type": "IDENT", "value": "x"})),
            Token(json!({"type": "ASSIGN"})),
            Token(json!({"type": "NUM", "value": "1"})),
        ])
        .with_ast(vec![AstNode(
            json!({"type": "Assign", "target": "x", "value": {"type": "Num", "value": 1}}),
        )])
        .with_type_errors(vec![])
        .with_code("mov eax, 1")
}

/// Let the driver task run until `mock` has seen `count` calls
async fn wait_for_calls(mock: &MockCompilationService, count: usize) {
    for _ in 0..1000 {
        if mock.calls().len() >= count {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!(
        "expected {} calls, saw {:?}",
        count,
        mock.calls()
    );
}

// =============================================================================
// Start
// =============================================================================

#[tokio::test]
async fn test_start_issues_exactly_one_tokenize_call() {
    let mock = Arc::new(assignment_mock());
    let gate = mock.hold(PipelinePhase::Tokenizing);
    let orchestrator = build(mock.clone());

    assert_eq!(orchestrator.current_phase(), PipelinePhase::Idle);
    orchestrator.start("x = 1").await.unwrap();
    assert_eq!(orchestrator.current_phase(), PipelinePhase::Tokenizing);

    wait_for_calls(&mock, 1).await;
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
    assert_eq!(mock.calls(), vec![PipelinePhase::Tokenizing]);

    gate.release();
    orchestrator.settled().await;
}

#[tokio::test]
async fn test_start_rejects_empty_source() {
    let mock = Arc::new(assignment_mock());
    let orchestrator = build(mock.clone());

    let err = orchestrator.start("").await.err().unwrap();
    assert!(matches!(err, PipelineError::InvalidInput(_)));
    assert_eq!(orchestrator.current_phase(), PipelinePhase::Idle);
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn test_start_rejected_unless_idle() {
    let mock = Arc::new(assignment_mock());
    let gate = mock.hold(PipelinePhase::Parsing);
    let orchestrator = build(mock.clone());

    orchestrator.start("x = 1").await.unwrap();
    wait_for_calls(&mock, 2).await;

    let err = orchestrator.start("y = 2").await.err().unwrap();
    assert!(matches!(err, PipelineError::InvalidInput(_)));

    gate.release();
    assert_eq!(orchestrator.settled().await, PipelinePhase::Completed);

    // Completed is not Idle either
    let err = orchestrator.start("y = 2").await.err().unwrap();
    assert!(matches!(err, PipelineError::InvalidInput(_)));
    assert_eq!(orchestrator.source().await.as_deref(), Some("x = 1"));
}

// =============================================================================
// Ordering
// =============================================================================

#[tokio::test]
async fn test_no_parse_before_tokens_are_stored() {
    let mock = Arc::new(assignment_mock());
    let gate = mock.hold(PipelinePhase::Tokenizing);
    let orchestrator = build(mock.clone());

    orchestrator.start("x = 1").await.unwrap();
    wait_for_calls(&mock, 1).await;
    for _ in 0..100 {
        tokio::task::yield_now().await;
    }

    assert_eq!(mock.call_count(PipelinePhase::Parsing), 0);
    assert!(orchestrator
        .result_for(PipelinePhase::Tokenizing)
        .await
        .is_none());

    gate.release();
    assert_eq!(orchestrator.settled().await, PipelinePhase::Completed);
    assert_eq!(mock.calls(), PipelinePhase::STAGES.to_vec());
}

/// Service that records the orchestrator's phase at the moment each call arrives
struct PhaseProbe {
    progress: OnceLock<watch::Receiver<PipelinePhase>>,
    seen: Mutex<Vec<(PipelinePhase, PipelinePhase)>>,
}

impl PhaseProbe {
    fn record(&self, call: PipelinePhase) {
        let phase = self
            .progress
            .get()
            .map(|rx| *rx.borrow())
            .unwrap_or(PipelinePhase::Idle);
        self.seen.lock().unwrap().push((call, phase));
    }
}

#[async_trait]
impl CompilationService for PhaseProbe {
    async fn tokenize(&self, _source: &Source) -> pipec_client::Result<Vec<Token>> {
        self.record(PipelinePhase::Tokenizing);
        Ok(vec![Token(json!("t"))])
    }

    async fn parse(&self, tokens: &[Token]) -> pipec_client::Result<Vec<AstNode>> {
        self.record(PipelinePhase::Parsing);
        assert_eq!(tokens, &[Token(json!("t"))]);
        Ok(vec![AstNode(json!("n"))])
    }

    async fn typecheck(&self, ast: &[AstNode]) -> pipec_client::Result<Vec<TypeError>> {
        self.record(PipelinePhase::TypeChecking);
        assert_eq!(ast, &[AstNode(json!("n"))]);
        Ok(vec![])
    }

    async fn generate(&self, _ast: &[AstNode]) -> pipec_client::Result<GeneratedCode> {
        self.record(PipelinePhase::Generating);
        Ok(GeneratedCode::from("ret"))
    }

    fn name(&self) -> &str {
        "probe"
    }
}

#[tokio::test]
async fn test_each_call_issued_after_phase_advanced() {
    let probe = Arc::new(PhaseProbe {
        progress: OnceLock::new(),
        seen: Mutex::new(Vec::new()),
    });
    let orchestrator = OrchestratorBuilder::new()
        .with_service(probe.clone())
        .build()
        .unwrap();
    probe.progress.set(orchestrator.subscribe()).unwrap();

    let code = orchestrator.run("anything").await.unwrap();
    assert_eq!(code.as_str(), "ret");

    let seen = probe.seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 4);
    for (call, phase) in seen {
        assert_eq!(call, phase, "{} call issued while orchestrator was in {}", call, phase);
    }
}

// =============================================================================
// Type checking
// =============================================================================

#[tokio::test]
async fn test_type_errors_block_generation() {
    let mock = Arc::new(
        assignment_mock().with_type_errors(vec![TypeError(json!({"message": "type mismatch"}))]),
    );
    let orchestrator = build(mock.clone());

    let err = orchestrator.run("x = 1").await.unwrap_err();
    match &err {
        PipelineError::Failed(PhaseFailure::TypeCheck { errors }) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].message(), Some("type mismatch"));
        }
        other => panic!("Expected TypeCheckFailure, got {:?}", other),
    }

    assert_eq!(orchestrator.current_phase(), PipelinePhase::Failed);
    assert_eq!(mock.call_count(PipelinePhase::Generating), 0);
    assert!(orchestrator
        .result_for(PipelinePhase::Generating)
        .await
        .is_none());
    assert!(orchestrator.failure().await.unwrap().is_type_check());
}

#[tokio::test]
async fn test_clean_type_check_advances_to_generating() {
    let mock = Arc::new(assignment_mock());
    let gate = mock.hold(PipelinePhase::Generating);
    let orchestrator = build(mock.clone());
    let mut progress = orchestrator.subscribe();

    orchestrator.start("x = 1").await.unwrap();
    progress
        .wait_for(|phase| *phase == PipelinePhase::Generating)
        .await
        .unwrap();
    wait_for_calls(&mock, 4).await;
    assert_eq!(mock.call_count(PipelinePhase::Generating), 1);
    assert_eq!(
        orchestrator.result_for(PipelinePhase::TypeChecking).await,
        Some(PhaseResult::Errors(vec![]))
    );

    gate.release();
    assert_eq!(orchestrator.settled().await, PipelinePhase::Completed);
    assert_eq!(mock.call_count(PipelinePhase::Generating), 1);
}

// =============================================================================
// Transport failures
// =============================================================================

#[tokio::test]
async fn test_transport_failure_halts_pipeline() {
    let mock = Arc::new(
        assignment_mock().with_failure(PipelinePhase::Parsing, "parse returned HTTP 500: boom"),
    );
    let orchestrator = build(mock.clone());

    let err = orchestrator.run("x = 1").await.unwrap_err();
    assert_eq!(
        err,
        PipelineError::Failed(PhaseFailure::Transport {
            phase: PipelinePhase::Parsing,
            message: "parse returned HTTP 500: boom".to_string(),
        })
    );
    assert_eq!(
        mock.calls(),
        vec![PipelinePhase::Tokenizing, PipelinePhase::Parsing]
    );
    assert!(orchestrator
        .result_for(PipelinePhase::Tokenizing)
        .await
        .is_some());
    assert!(orchestrator.result_for(PipelinePhase::Parsing).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_call_timeout_is_transport_error() {
    let mock = Arc::new(assignment_mock().with_delay(PipelinePhase::TypeChecking, Duration::from_secs(60)));
    let orchestrator = OrchestratorBuilder::new()
        .with_service(mock.clone())
        .with_call_timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    let err = orchestrator.run("x = 1").await.unwrap_err();
    match err {
        PipelineError::Failed(PhaseFailure::Transport { phase, message }) => {
            assert_eq!(phase, PipelinePhase::TypeChecking);
            assert_eq!(message, "typecheck call timed out after 2000ms");
        }
        other => panic!("Expected transport error, got {:?}", other),
    }
    assert_eq!(mock.call_count(PipelinePhase::Generating), 0);
}

#[tokio::test]
async fn test_no_automatic_retry() {
    let mock = Arc::new(assignment_mock().with_failure(PipelinePhase::Tokenizing, "refused"));
    let orchestrator = build(mock.clone());

    assert!(orchestrator.run("x = 1").await.is_err());
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
    assert_eq!(mock.calls(), vec![PipelinePhase::Tokenizing]);
}

// =============================================================================
// Reset
// =============================================================================

#[tokio::test]
async fn test_reset_refused_while_call_outstanding() {
    let mock = Arc::new(assignment_mock());
    let gate = mock.hold(PipelinePhase::TypeChecking);
    let orchestrator = build(mock.clone());

    orchestrator.start("x = 1").await.unwrap();
    wait_for_calls(&mock, 3).await;

    assert_eq!(
        orchestrator.reset().await,
        Err(PipelineError::Busy {
            phase: PipelinePhase::TypeChecking
        })
    );
    assert!(orchestrator.result_for(PipelinePhase::Parsing).await.is_some());

    gate.release();
    assert_eq!(orchestrator.settled().await, PipelinePhase::Completed);
}

#[tokio::test]
async fn test_reset_after_completion_and_failure() {
    let mock = Arc::new(assignment_mock());
    let orchestrator = build(mock.clone());

    // Idle
    orchestrator.reset().await.unwrap();

    // Completed
    orchestrator.run("x = 1").await.unwrap();
    orchestrator.reset().await.unwrap();
    assert_eq!(orchestrator.current_phase(), PipelinePhase::Idle);
    for stage in PipelinePhase::STAGES {
        assert!(orchestrator.result_for(stage).await.is_none());
    }
    assert!(orchestrator.snapshot().await.run_id.is_none());

    // Failed, then a fresh run
    let failing = Arc::new(assignment_mock().with_failure(PipelinePhase::Generating, "down"));
    let orchestrator = build(failing);
    assert!(orchestrator.run("x = 1").await.is_err());
    orchestrator.reset().await.unwrap();
    assert!(orchestrator.failure().await.is_none());
    assert!(orchestrator.start("x = 2").await.is_ok());
}

/// Service whose parse implementation panics
struct CrashingParser;

#[async_trait]
impl CompilationService for CrashingParser {
    async fn tokenize(&self, _source: &Source) -> pipec_client::Result<Vec<Token>> {
        Ok(vec![Token(json!("t"))])
    }

    async fn parse(&self, _tokens: &[Token]) -> pipec_client::Result<Vec<AstNode>> {
        panic!("parser backend crashed");
    }

    async fn typecheck(&self, _ast: &[AstNode]) -> pipec_client::Result<Vec<TypeError>> {
        Ok(vec![])
    }

    async fn generate(&self, _ast: &[AstNode]) -> pipec_client::Result<GeneratedCode> {
        Ok(GeneratedCode::from("ret"))
    }

    fn name(&self) -> &str {
        "crashing"
    }
}

#[tokio::test]
async fn test_crashed_call_fails_stage_and_allows_reset() {
    let orchestrator = OrchestratorBuilder::new()
        .with_service(Arc::new(CrashingParser))
        .build()
        .unwrap();

    let err = orchestrator.run("x = 1").await.unwrap_err();
    match err {
        PipelineError::Failed(PhaseFailure::Transport { phase, message }) => {
            assert_eq!(phase, PipelinePhase::Parsing);
            assert!(message.starts_with("parse call aborted"), "{}", message);
        }
        other => panic!("Expected transport error, got {:?}", other),
    }
    assert_eq!(orchestrator.current_phase(), PipelinePhase::Failed);
    assert!(orchestrator
        .result_for(PipelinePhase::Tokenizing)
        .await
        .is_some());
    assert!(orchestrator.snapshot().await.finished_at.is_some());

    orchestrator.reset().await.unwrap();
    assert_eq!(orchestrator.current_phase(), PipelinePhase::Idle);
    orchestrator.start("y = 2").await.unwrap();
    assert_eq!(orchestrator.settled().await, PipelinePhase::Failed);
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_assignment_scenario() {
    let mock = Arc::new(assignment_mock());
    let orchestrator = build(mock.clone());

    let code = orchestrator.run("x = 1").await.unwrap();
    assert_eq!(code.as_str(), "mov eax, 1");
    assert_eq!(orchestrator.current_phase(), PipelinePhase::Completed);
    assert_eq!(
        orchestrator.result_for(PipelinePhase::Generating).await,
        Some(PhaseResult::Code(GeneratedCode::from("mov eax, 1")))
    );
    match orchestrator.result_for(PipelinePhase::Tokenizing).await {
        Some(PhaseResult::Tokens(tokens)) => assert_eq!(tokens.len(), 3),
        other => panic!("Expected tokens, got {:?}", other),
    }
    match orchestrator.result_for(PipelinePhase::Parsing).await {
        Some(PhaseResult::Ast(ast)) => assert_eq!(ast.len(), 1),
        other => panic!("Expected AST, got {:?}", other),
    }
}

#[tokio::test]
async fn test_progress_notifications_in_order() {
    let mock = Arc::new(assignment_mock());
    let gate = mock.hold(PipelinePhase::Tokenizing);
    let orchestrator = build(mock.clone());
    let mut progress = orchestrator.subscribe();
    progress.borrow_and_update();

    orchestrator.start("x = 1").await.unwrap();
    let mut observed = Vec::new();
    progress.changed().await.unwrap();
    observed.push(*progress.borrow_and_update());

    gate.release();
    while !observed.last().unwrap().is_terminal() {
        progress.changed().await.unwrap();
        observed.push(*progress.borrow_and_update());
    }

    // watch coalesces updates, so only order and endpoints are guaranteed
    assert_eq!(observed.first(), Some(&PipelinePhase::Tokenizing));
    assert_eq!(observed.last(), Some(&PipelinePhase::Completed));
    let mut sorted = observed.clone();
    sorted.sort_by_key(|p| p.stage_index().unwrap_or(usize::MAX));
    assert_eq!(observed, sorted);
}
