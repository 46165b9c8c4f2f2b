//! Pipeline state machine
//!
//! A run is one [`PipelineState`] value. Each variant holds exactly the artifacts
//! that exist in that phase, so a state can never carry, say, generated code
//! without the AST it came from. Every transition is a method that consumes the
//! current variant and checks it is the one the transition expects.

use crate::artifact::{AstNode, GeneratedCode, PhaseResult, Source, Token, TypeError};
use crate::error::{PhaseFailure, PipelineError, Result};
use crate::phase::{CheckpointStatus, PipelinePhase};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Tokenizing {
        source: Source,
    },
    Parsing {
        source: Source,
        tokens: Vec<Token>,
    },
    TypeChecking {
        source: Source,
        tokens: Vec<Token>,
        ast: Vec<AstNode>,
    },
    Generating {
        source: Source,
        tokens: Vec<Token>,
        ast: Vec<AstNode>,
    },
    Completed {
        source: Source,
        tokens: Vec<Token>,
        ast: Vec<AstNode>,
        code: GeneratedCode,
    },
    Failed {
        failure: PhaseFailure,
        /// State the run was in when it failed
        at: Box<PipelineState>,
    },
}

impl PipelineState {
    pub fn phase(&self) -> PipelinePhase {
        match self {
            PipelineState::Idle => PipelinePhase::Idle,
            PipelineState::Tokenizing { .. } => PipelinePhase::Tokenizing,
            PipelineState::Parsing { .. } => PipelinePhase::Parsing,
            PipelineState::TypeChecking { .. } => PipelinePhase::TypeChecking,
            PipelineState::Generating { .. } => PipelinePhase::Generating,
            PipelineState::Completed { .. } => PipelinePhase::Completed,
            PipelineState::Failed { .. } => PipelinePhase::Failed,
        }
    }

    pub fn source(&self) -> Option<&Source> {
        match self {
            PipelineState::Idle => None,
            PipelineState::Tokenizing { source }
            | PipelineState::Parsing { source, .. }
            | PipelineState::TypeChecking { source, .. }
            | PipelineState::Generating { source, .. }
            | PipelineState::Completed { source, .. } => Some(source),
            PipelineState::Failed { at, .. } => at.source(),
        }
    }

    pub fn failure(&self) -> Option<&PhaseFailure> {
        match self {
            PipelineState::Failed { failure, .. } => Some(failure),
            _ => None,
        }
    }

    /// Result retained for `phase`, if that stage has completed
    ///
    /// A type check that reported errors counts as completed: its errors are
    /// the result even though the run failed.
    pub fn result_for(&self, phase: PipelinePhase) -> Option<PhaseResult> {
        match (self, phase) {
            (PipelineState::Failed { failure, at }, _) => match failure {
                PhaseFailure::TypeCheck { errors } if phase == PipelinePhase::TypeChecking => {
                    Some(PhaseResult::Errors(errors.clone()))
                }
                _ => at.result_for(phase),
            },
            (
                PipelineState::Parsing { tokens, .. }
                | PipelineState::TypeChecking { tokens, .. }
                | PipelineState::Generating { tokens, .. }
                | PipelineState::Completed { tokens, .. },
                PipelinePhase::Tokenizing,
            ) => Some(PhaseResult::Tokens(tokens.clone())),
            (
                PipelineState::TypeChecking { ast, .. }
                | PipelineState::Generating { ast, .. }
                | PipelineState::Completed { ast, .. },
                PipelinePhase::Parsing,
            ) => Some(PhaseResult::Ast(ast.clone())),
            (
                PipelineState::Generating { .. } | PipelineState::Completed { .. },
                PipelinePhase::TypeChecking,
            ) => Some(PhaseResult::Errors(Vec::new())),
            (PipelineState::Completed { code, .. }, PipelinePhase::Generating) => {
                Some(PhaseResult::Code(code.clone()))
            }
            _ => None,
        }
    }

    /// Progress indicator status of one stage
    pub fn checkpoint(&self, stage: PipelinePhase) -> CheckpointStatus {
        if self.failure().map(PhaseFailure::phase) == Some(stage) {
            CheckpointStatus::Failed
        } else if self.phase() == stage {
            CheckpointStatus::Active
        } else if stage.is_stage() && self.result_for(stage).is_some() {
            CheckpointStatus::Done
        } else {
            CheckpointStatus::Pending
        }
    }

    /// Idle -> Tokenizing
    pub fn start(&mut self, source: Source) -> Result<()> {
        match self {
            PipelineState::Idle => {
                *self = PipelineState::Tokenizing { source };
                Ok(())
            }
            other => Err(PipelineError::InvalidInput(format!(
                "pipeline is not idle (current phase: {})",
                other.phase()
            ))),
        }
    }

    /// Tokenizing -> Parsing
    pub fn tokenized(&mut self, tokens: Vec<Token>) -> Result<()> {
        match std::mem::take(self) {
            PipelineState::Tokenizing { source } => {
                *self = PipelineState::Parsing { source, tokens };
                Ok(())
            }
            other => self.reject(other, PipelinePhase::Tokenizing),
        }
    }

    /// Parsing -> TypeChecking
    pub fn parsed(&mut self, ast: Vec<AstNode>) -> Result<()> {
        match std::mem::take(self) {
            PipelineState::Parsing { source, tokens } => {
                *self = PipelineState::TypeChecking {
                    source,
                    tokens,
                    ast,
                };
                Ok(())
            }
            other => self.reject(other, PipelinePhase::Parsing),
        }
    }

    /// TypeChecking -> Generating, or TypeChecking -> Failed when errors were reported
    pub fn type_checked(&mut self, errors: Vec<TypeError>) -> Result<PipelinePhase> {
        match std::mem::take(self) {
            PipelineState::TypeChecking {
                source,
                tokens,
                ast,
            } => {
                if errors.is_empty() {
                    *self = PipelineState::Generating {
                        source,
                        tokens,
                        ast,
                    };
                } else {
                    *self = PipelineState::Failed {
                        failure: PhaseFailure::TypeCheck { errors },
                        at: Box::new(PipelineState::TypeChecking {
                            source,
                            tokens,
                            ast,
                        }),
                    };
                }
                Ok(self.phase())
            }
            other => self.reject(other, PipelinePhase::TypeChecking),
        }
    }

    /// Generating -> Completed
    pub fn generated(&mut self, code: GeneratedCode) -> Result<()> {
        match std::mem::take(self) {
            PipelineState::Generating {
                source,
                tokens,
                ast,
            } => {
                *self = PipelineState::Completed {
                    source,
                    tokens,
                    ast,
                    code,
                };
                Ok(())
            }
            other => self.reject(other, PipelinePhase::Generating),
        }
    }

    /// Any stage -> Failed
    pub fn fail(&mut self, failure: PhaseFailure) -> Result<()> {
        let current = std::mem::take(self);
        if current.phase() != failure.phase() {
            let expected = failure.phase();
            return self.reject(current, expected);
        }
        *self = PipelineState::Failed {
            failure,
            at: Box::new(current),
        };
        Ok(())
    }

    /// Back to Idle, discarding every retained result
    ///
    /// Refused while a stage call is outstanding.
    pub fn reset(&mut self) -> Result<()> {
        let phase = self.phase();
        if phase.is_stage() {
            return Err(PipelineError::Busy { phase });
        }
        *self = PipelineState::Idle;
        Ok(())
    }

    fn reject<T>(&mut self, previous: PipelineState, expected: PipelinePhase) -> Result<T> {
        let actual = previous.phase();
        *self = previous;
        Err(PipelineError::Internal(format!(
            "cannot complete {} while in {}",
            expected, actual
        )))
    }
}
