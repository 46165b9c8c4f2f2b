//! Orchestrator implementation

use super::types::{PipelineSnapshot, RunHandle, StageDetail};
use crate::builder::OrchestratorBuilder;
use chrono::{DateTime, Utc};
use pipec_client::CompilationService;
use pipec_core::{
    GeneratedCode, PhaseFailure, PhaseResult, PipelineError, PipelinePhase, PipelineState,
    Result, Source,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinError;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Compilation Orchestrator
///
/// Runs one pipeline at a time. [`Orchestrator::start`] spawns a driver task
/// that awaits tokenize, parse, typecheck and generate in turn, storing each
/// result before the next call is issued. Cloning yields another handle to the
/// same orchestrator.
#[derive(Clone)]
pub struct Orchestrator {
    shared: Arc<Shared>,
}

struct Shared {
    service: Arc<dyn CompilationService>,
    call_timeout: Duration,
    run: RwLock<Run>,
    progress: watch::Sender<PipelinePhase>,
}

#[derive(Default)]
struct Run {
    state: PipelineState,
    run_id: Option<Uuid>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl Orchestrator {
    pub(crate) fn new(service: Arc<dyn CompilationService>, call_timeout: Duration) -> Self {
        let (progress, _) = watch::channel(PipelinePhase::Idle);
        Self {
            shared: Arc::new(Shared {
                service,
                call_timeout,
                run: RwLock::new(Run::default()),
                progress,
            }),
        }
    }

    /// Create a builder
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Name of the Compilation Service implementation
    pub fn service_name(&self) -> &str {
        self.shared.service.name()
    }

    pub fn call_timeout(&self) -> Duration {
        self.shared.call_timeout
    }

    /// Start a run
    ///
    /// Fails with [`PipelineError::InvalidInput`] when the source is blank or the
    /// orchestrator is not idle. On success the phase is `Tokenizing` and the
    /// tokenize call has been handed to the driver task.
    pub async fn start(&self, source: impl Into<String>) -> Result<RunHandle> {
        let source = Source::new(source)?;
        let run_id = Uuid::new_v4();

        {
            let mut run = self.shared.run.write().await;
            run.state.start(source.clone())?;
            run.run_id = Some(run_id);
            run.started_at = Some(Utc::now());
            run.finished_at = None;
            self.shared.progress.send_replace(PipelinePhase::Tokenizing);
        }

        info!(
            "Pipeline run {} started ({} bytes of source)",
            run_id,
            source.as_str().len()
        );

        let shared = self.shared.clone();
        let span = info_span!("pipeline_run", run_id = %run_id);
        let task = tokio::spawn(
            async move {
                // A panicking service call must still land the run in `Failed`
                let driver = {
                    let shared = shared.clone();
                    tokio::spawn(
                        async move { shared.drive(run_id, source).await }.in_current_span(),
                    )
                };
                match driver.await {
                    Ok(outcome) => outcome,
                    Err(err) => shared.abandon(err).await,
                }
            }
            .instrument(span),
        );

        Ok(RunHandle { run_id, task })
    }

    /// Start a run and wait for it to finish
    pub async fn run(&self, source: impl Into<String>) -> Result<GeneratedCode> {
        self.start(source).await?.wait().await
    }

    /// Return to `Idle`, discarding all retained results
    ///
    /// Fails with [`PipelineError::Busy`] while a stage call is outstanding.
    pub async fn reset(&self) -> Result<()> {
        let mut run = self.shared.run.write().await;
        if let Err(err) = run.state.reset() {
            debug!("Reset refused: {}", err);
            return Err(err);
        }
        *run = Run::default();
        self.shared.progress.send_replace(PipelinePhase::Idle);
        info!("Pipeline reset");
        Ok(())
    }

    pub fn current_phase(&self) -> PipelinePhase {
        *self.shared.progress.borrow()
    }

    /// Result retained for a completed stage
    pub async fn result_for(&self, phase: PipelinePhase) -> Option<PhaseResult> {
        self.shared.run.read().await.state.result_for(phase)
    }

    /// Why the current run failed, if it did
    pub async fn failure(&self) -> Option<PhaseFailure> {
        self.shared.run.read().await.state.failure().cloned()
    }

    /// Source text of the current run
    pub async fn source(&self) -> Option<String> {
        let run = self.shared.run.read().await;
        run.state.source().map(|s| s.as_str().to_string())
    }

    /// Checkpoint, retained result and failure of one stage, read together
    ///
    /// `None` unless `stage` is one of the four stages.
    pub async fn stage_detail(&self, stage: PipelinePhase) -> Option<StageDetail> {
        let run = self.shared.run.read().await;
        StageDetail::capture(&run.state, stage)
    }

    pub async fn snapshot(&self) -> PipelineSnapshot {
        let run = self.shared.run.read().await;
        PipelineSnapshot::capture(&run.state, run.run_id, run.started_at, run.finished_at)
    }

    /// Receive every phase change
    pub fn subscribe(&self) -> watch::Receiver<PipelinePhase> {
        self.shared.progress.subscribe()
    }

    /// Wait until no stage call is outstanding and return the phase
    pub async fn settled(&self) -> PipelinePhase {
        let mut progress = self.subscribe();
        loop {
            let phase = *progress.borrow_and_update();
            if !phase.is_stage() {
                return phase;
            }
            if progress.changed().await.is_err() {
                return self.current_phase();
            }
        }
    }
}

impl Shared {
    /// Run the four stages in order
    async fn drive(&self, run_id: Uuid, source: Source) -> Result<GeneratedCode> {
        let tokens = self
            .call(PipelinePhase::Tokenizing, self.service.tokenize(&source))
            .await?;
        self.commit(|state| state.tokenized(tokens.clone())).await?;

        let ast = self
            .call(PipelinePhase::Parsing, self.service.parse(&tokens))
            .await?;
        self.commit(|state| state.parsed(ast.clone())).await?;

        let errors = self
            .call(PipelinePhase::TypeChecking, self.service.typecheck(&ast))
            .await?;
        let next = self
            .commit(|state| state.type_checked(errors.clone()))
            .await?;
        if next == PipelinePhase::Failed {
            warn!("Type check reported {} error(s), skipping generation", errors.len());
            return Err(PhaseFailure::TypeCheck { errors }.into());
        }

        let code = self
            .call(PipelinePhase::Generating, self.service.generate(&ast))
            .await?;
        self.commit(|state| state.generated(code.clone())).await?;

        info!("Pipeline run {} completed", run_id);
        Ok(code)
    }

    /// Await one stage call, bounded by the call timeout
    ///
    /// A failed call moves the run to `Failed` before the error is returned.
    async fn call<T, F>(&self, phase: PipelinePhase, request: F) -> Result<T>
    where
        F: Future<Output = pipec_client::Result<T>>,
    {
        let endpoint = phase.endpoint().unwrap_or("unknown");
        debug!("Issuing {} call", endpoint);

        let message = match tokio::time::timeout(self.call_timeout, request).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => err.to_string(),
            Err(_) => format!(
                "{} call timed out after {}ms",
                endpoint,
                self.call_timeout.as_millis()
            ),
        };

        warn!("{} failed: {}", phase, message);
        let failure = PhaseFailure::Transport { phase, message };
        self.commit(|state| state.fail(failure.clone())).await?;
        Err(failure.into())
    }

    /// Fail the stage whose driver task died before reaching a terminal phase
    async fn abandon(&self, err: JoinError) -> Result<GeneratedCode> {
        let phase = self.run.read().await.state.phase();
        error!("Pipeline driver died during {}: {}", phase, err);

        if !phase.is_stage() {
            return Err(PipelineError::Internal(format!(
                "pipeline task failed: {}",
                err
            )));
        }

        let failure = PhaseFailure::Transport {
            phase,
            message: format!(
                "{} call aborted: {}",
                phase.endpoint().unwrap_or("unknown"),
                err
            ),
        };
        self.commit(|state| state.fail(failure.clone())).await?;
        Err(failure.into())
    }

    /// Apply a transition to the current run and publish the new phase
    async fn commit<T>(
        &self,
        transition: impl FnOnce(&mut PipelineState) -> Result<T>,
    ) -> Result<T> {
        let mut run = self.run.write().await;
        let out = transition(&mut run.state)?;
        let phase = run.state.phase();
        if phase.is_terminal() {
            run.finished_at = Some(Utc::now());
        }
        self.progress.send_replace(phase);
        info!("Pipeline advanced to {}", phase);
        Ok(out)
    }
}
