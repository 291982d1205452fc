use crate::config::DeployConfig;
use crate::deploy::DeploymentClient;
use crate::error::DeckError;
use crate::locator::AppLocator;
use crate::phase::{PhaseStore, PhaseTracker};
use crate::prompt::{PromptGenerator, PromptPayload};
use crate::types::{AppIdentity, AppSource};
use crate::validator::{StructureValidator, ValidationResult, Violation};
use serde::Serialize;
use std::fmt;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Resolving,
    Validating,
    Deploying,
    PromptGenerating,
    Done,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Resolving => "resolving",
            Stage::Validating => "validating",
            Stage::Deploying => "deploying",
            Stage::PromptGenerating => "prompt_generating",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Failure
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidIdentity,
    NotFound,
    ReadError,
    AmbiguousApp,
    ValidationFailure,
    UnknownPhase,
    TerminalPhase,
    InvalidEndpoint,
    TransportFailure,
    Internal,
}

impl From<&DeckError> for FailureKind {
    fn from(e: &DeckError) -> Self {
        match e {
            DeckError::InvalidIdentity(_) => FailureKind::InvalidIdentity,
            DeckError::NotFound { .. } => FailureKind::NotFound,
            DeckError::Read { .. } => FailureKind::ReadError,
            DeckError::AmbiguousApp { .. } => FailureKind::AmbiguousApp,
            DeckError::UnknownPhase(_) | DeckError::InvalidPhaseOrder(_) => {
                FailureKind::UnknownPhase
            }
            DeckError::TerminalPhase(_) => FailureKind::TerminalPhase,
            DeckError::InvalidEndpoint(_) => FailureKind::InvalidEndpoint,
            _ => FailureKind::Internal,
        }
    }
}

/// Structured description of why a run stopped.
#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub stage: Stage,
    pub kind: FailureKind,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
}

impl Failure {
    fn from_error(stage: Stage, e: &DeckError) -> Self {
        Self {
            stage,
            kind: FailureKind::from(e),
            message: e.to_string(),
            violations: Vec::new(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.message)?;
        for v in &self.violations {
            write!(f, "\n  {v}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Terminal payload of a run: a success payload or a failure, never both.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Deployed {
        identity: AppIdentity,
        live_url: String,
    },
    Prompted {
        payload: PromptPayload,
    },
    Failed(Failure),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::Failed(_))
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Drives one invocation: resolve, validate, then deploy or generate a prompt.
pub struct Pipeline<'a> {
    locator: &'a AppLocator,
    validator: &'a StructureValidator,
    stage: Stage,
    visited: Vec<Stage>,
}

impl<'a> Pipeline<'a> {
    pub fn new(locator: &'a AppLocator, validator: &'a StructureValidator) -> Self {
        Self {
            locator,
            validator,
            stage: Stage::Idle,
            visited: vec![Stage::Idle],
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Every stage entered so far, in order.
    pub fn visited(&self) -> &[Stage] {
        &self.visited
    }

    fn enter(&mut self, next: Stage) {
        tracing::debug!(from = %self.stage, to = %next, "pipeline stage");
        self.stage = next;
        self.visited.push(next);
    }

    fn finish(&mut self, outcome: Outcome) -> Outcome {
        self.enter(Stage::Done);
        outcome
    }

    fn fail(&mut self, failure: Failure) -> Outcome {
        tracing::debug!(stage = %failure.stage, kind = ?failure.kind, "pipeline failed");
        self.finish(Outcome::Failed(failure))
    }

    /// Resolve and validate without dispatching. The validation verdict is
    /// returned even when it lists violations.
    pub fn inspect(&mut self, target: &str) -> Result<(AppSource, ValidationResult), Failure> {
        self.enter(Stage::Resolving);
        let source = self
            .locator
            .lookup(target)
            .and_then(|identity| self.locator.resolve(&identity))
            .map_err(|e| Failure::from_error(Stage::Resolving, &e))?;

        self.enter(Stage::Validating);
        let result = self.validator.validate(&source);
        Ok((source, result))
    }

    fn resolve_and_validate(&mut self, target: &str) -> Result<AppSource, Failure> {
        let (source, result) = self.inspect(target)?;
        if result.valid {
            return Ok(source);
        }
        Err(Failure {
            stage: Stage::Validating,
            kind: FailureKind::ValidationFailure,
            message: format!(
                "{} has {} structural violation(s)",
                source.identity,
                result.violations.len()
            ),
            violations: result.violations,
        })
    }

    /// `deploy <app>`. The client is built only once the app has passed
    /// validation, so structural violations are reported even when no
    /// endpoint is configured.
    pub fn deploy(&mut self, target: &str, deploy: &DeployConfig) -> Outcome {
        let source = match self.resolve_and_validate(target) {
            Ok(s) => s,
            Err(f) => return self.fail(f),
        };

        self.enter(Stage::Deploying);
        let client = match DeploymentClient::new(deploy) {
            Ok(c) => c,
            Err(e) => return self.fail(Failure::from_error(Stage::Deploying, &e)),
        };
        let response = match client.deploy(&source) {
            Ok(r) => r,
            Err(e) => return self.fail(Failure::from_error(Stage::Deploying, &e)),
        };

        match (response.success, response.live_url) {
            (true, Some(live_url)) => self.finish(Outcome::Deployed {
                identity: source.identity,
                live_url,
            }),
            _ => self.fail(Failure {
                stage: Stage::Deploying,
                kind: FailureKind::TransportFailure,
                message: response
                    .error_message
                    .unwrap_or_else(|| "host returned no live URL".to_string()),
                violations: Vec::new(),
            }),
        }
    }

    /// `prompt <app> [phase]`
    pub fn prompt<S: PhaseStore>(
        &mut self,
        target: &str,
        phase: Option<&str>,
        tracker: &PhaseTracker<S>,
        generator: &PromptGenerator,
    ) -> Outcome {
        let source = match self.resolve_and_validate(target) {
            Ok(s) => s,
            Err(f) => return self.fail(f),
        };

        self.enter(Stage::PromptGenerating);
        let payload = tracker
            .current_phase(&source.identity, phase)
            .and_then(|p| generator.generate(&source, &p));
        match payload {
            Ok(payload) => self.finish(Outcome::Prompted { payload }),
            Err(e) => self.fail(Failure::from_error(Stage::PromptGenerating, &e)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
