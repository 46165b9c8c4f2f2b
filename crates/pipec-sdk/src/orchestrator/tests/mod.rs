//! Unit tests for the orchestrator internals

use super::*;
use pipec_client::MockCompilationService;
use pipec_core::{CheckpointStatus, PhaseResult, PipelinePhase, Token, TypeError};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn orchestrator(mock: MockCompilationService) -> Orchestrator {
    Orchestrator::builder()
        .with_service(Arc::new(mock))
        .with_call_timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_idle_snapshot() {
    let orchestrator = orchestrator(MockCompilationService::new());
    let snapshot = orchestrator.snapshot().await;

    assert_eq!(snapshot.phase, PipelinePhase::Idle);
    assert!(snapshot.run_id.is_none());
    assert_eq!(snapshot.checkpoints.len(), 4);
    assert!(snapshot
        .checkpoints
        .iter()
        .all(|c| c.status == CheckpointStatus::Pending));
    assert_eq!(
        snapshot
            .checkpoints
            .iter()
            .map(|c| c.endpoint)
            .collect::<Vec<_>>(),
        vec!["tokenize", "parse", "typecheck", "generate"]
    );
    assert!(snapshot.elapsed_ms().is_none());
}

#[tokio::test]
async fn test_completed_snapshot() {
    let orchestrator = orchestrator(
        MockCompilationService::new()
            .with_tokens(vec![Token(json!(["HALT", "HALT"]))])
            .with_code("mov rax, 60"),
    );
    let handle = orchestrator.start("HALT").await.unwrap();
    let run_id = handle.run_id();
    handle.wait().await.unwrap();

    let snapshot = orchestrator.snapshot().await;
    assert_eq!(snapshot.run_id, Some(run_id));
    assert_eq!(snapshot.phase, PipelinePhase::Completed);
    assert!(snapshot
        .checkpoints
        .iter()
        .all(|c| c.status == CheckpointStatus::Done));
    assert!(snapshot.failure.is_none());
    assert!(snapshot.elapsed_ms().unwrap() >= 0);
}

#[tokio::test]
async fn test_failed_snapshot_marks_stage() {
    let orchestrator = orchestrator(
        MockCompilationService::new().with_type_errors(vec![TypeError(json!(
            "PUSH value must be an integer."
        ))]),
    );
    let _ = orchestrator.run("PUSH \"a\"").await;

    let snapshot = orchestrator.snapshot().await;
    assert_eq!(snapshot.phase, PipelinePhase::Failed);
    assert_eq!(
        snapshot.checkpoint(PipelinePhase::TypeChecking).unwrap().status,
        CheckpointStatus::Failed
    );
    assert_eq!(
        snapshot.checkpoint(PipelinePhase::Generating).unwrap().status,
        CheckpointStatus::Pending
    );
    assert!(snapshot.failure.as_ref().unwrap().is_type_check());
    assert!(snapshot.finished_at.is_some());
}

#[tokio::test]
async fn test_stage_detail_while_call_outstanding() {
    let mock = MockCompilationService::new().with_tokens(vec![Token(json!(["PUSH", 1]))]);
    let gate = mock.hold(PipelinePhase::Parsing);
    let orchestrator = orchestrator(mock);
    orchestrator.start("PUSH 1").await.unwrap();

    let mut progress = orchestrator.subscribe();
    progress
        .wait_for(|phase| *phase == PipelinePhase::Parsing)
        .await
        .unwrap();

    let parsing = orchestrator
        .stage_detail(PipelinePhase::Parsing)
        .await
        .unwrap();
    assert_eq!(parsing.checkpoint.status, CheckpointStatus::Active);
    assert!(parsing.result.is_none());
    assert!(parsing.failure.is_none());

    let tokenizing = orchestrator
        .stage_detail(PipelinePhase::Tokenizing)
        .await
        .unwrap();
    assert_eq!(tokenizing.checkpoint.status, CheckpointStatus::Done);
    assert_eq!(tokenizing.checkpoint.endpoint, "tokenize");
    assert_eq!(
        tokenizing.result,
        Some(PhaseResult::Tokens(vec![Token(json!(["PUSH", 1]))]))
    );

    gate.release();
    assert_eq!(orchestrator.settled().await, PipelinePhase::Completed);
}

#[tokio::test]
async fn test_stage_detail_of_failed_stage() {
    let orchestrator = orchestrator(
        MockCompilationService::new().with_failure(PipelinePhase::Generating, "HTTP 500"),
    );
    let _ = orchestrator.run("HALT").await;

    let generating = orchestrator
        .stage_detail(PipelinePhase::Generating)
        .await
        .unwrap();
    assert_eq!(generating.checkpoint.status, CheckpointStatus::Failed);
    assert!(generating.result.is_none());
    assert_eq!(
        generating.failure.map(|f| f.phase()),
        Some(PipelinePhase::Generating)
    );

    let typecheck = orchestrator
        .stage_detail(PipelinePhase::TypeChecking)
        .await
        .unwrap();
    assert_eq!(typecheck.checkpoint.status, CheckpointStatus::Done);
    assert!(typecheck.failure.is_none());
}

#[tokio::test]
async fn test_stage_detail_rejects_non_stage() {
    let orchestrator = orchestrator(MockCompilationService::new());
    for phase in [
        PipelinePhase::Idle,
        PipelinePhase::Completed,
        PipelinePhase::Failed,
    ] {
        assert!(orchestrator.stage_detail(phase).await.is_none());
    }
}

#[tokio::test]
async fn test_clones_share_state() {
    let orchestrator = orchestrator(MockCompilationService::new());
    let other = orchestrator.clone();

    orchestrator.run("HALT").await.unwrap();
    assert_eq!(other.current_phase(), PipelinePhase::Completed);
    assert_eq!(other.source().await.as_deref(), Some("HALT"));

    other.reset().await.unwrap();
    assert_eq!(orchestrator.current_phase(), PipelinePhase::Idle);
    assert!(orchestrator.source().await.is_none());
}
