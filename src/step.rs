//! Provisioning Step Framework
//!
//! Every step, whatever its body does, moves through the same state machine:
//!
//! ```text
//! Announced
//!     ↓
//! AwaitingConsent
//!     ↓                ↘
//! Executing            Skipped (operator declined, zero side effects)
//!     ↓        ↘
//! Completed    PartiallyFailed
//! ```
//!
//! The driver (`run_step`) owns the transitions; step implementations only
//! supply a name, a description, and a body returning per-sub-action
//! outcomes. A step that partially fails never halts the run; correction is
//! re-running the whole tool, not retrying in place.

use crate::config::ProvisionConfig;
use crate::console::Console;
use crate::elevation::PrivilegeLevel;
use crate::error::{ProvisionError, Result};
use crate::process::ProcessRunner;
use crate::registry::RegistryStore;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use strum::Display;
use thiserror::Error;

/// Outcome of one sub-action within a step. Purely transient; used only for
/// console reporting and the final summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Presence detection found the desired state; no external action ran.
    AlreadySatisfied { action: String },
    /// The change was applied successfully.
    Applied { action: String },
    /// The apply attempt errored; the step continued to its next sub-action.
    Failed { action: String, reason: String },
    /// A dependent resource (env var, directory, binary) is missing; the
    /// sub-action was skipped.
    Unavailable { action: String, resource: String },
}

impl ActionOutcome {
    pub fn already_satisfied(action: impl Into<String>) -> Self {
        Self::AlreadySatisfied {
            action: action.into(),
        }
    }

    pub fn applied(action: impl Into<String>) -> Self {
        Self::Applied {
            action: action.into(),
        }
    }

    pub fn failed(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            action: action.into(),
            reason: reason.into(),
        }
    }

    pub fn unavailable(action: impl Into<String>, resource: impl Into<String>) -> Self {
        Self::Unavailable {
            action: action.into(),
            resource: resource.into(),
        }
    }

    pub fn action(&self) -> &str {
        match self {
            Self::AlreadySatisfied { action }
            | Self::Applied { action }
            | Self::Failed { action, .. }
            | Self::Unavailable { action, .. } => action,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Terminal result of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StepOutcome {
    /// Operator declined; zero side effects.
    #[strum(serialize = "skipped")]
    Skipped,
    /// Every sub-action succeeded or was already satisfied.
    #[strum(serialize = "completed")]
    Completed,
    /// At least one sub-action errored.
    #[strum(serialize = "partially failed")]
    PartiallyFailed,
}

/// Stages a step passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepStage {
    /// The description has been printed.
    Announced,
    /// The confirmation gate is blocking on the operator.
    AwaitingConsent,
    /// Sub-actions are running.
    Executing,
    /// Terminal: operator declined.
    Skipped,
    /// Terminal: all sub-actions succeeded or were already satisfied.
    Completed,
    /// Terminal: at least one sub-action errored.
    PartiallyFailed,
}

impl StepStage {
    /// Returns true if this is a terminal stage.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Skipped | Self::Completed | Self::PartiallyFailed)
    }

    /// Whether `self → to` is a legal transition.
    pub const fn can_transition(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Announced, Self::AwaitingConsent)
                | (Self::AwaitingConsent, Self::Skipped)
                | (Self::AwaitingConsent, Self::Executing)
                // A confirmation failure (non-interactive run) terminates the
                // step without executing anything.
                | (Self::AwaitingConsent, Self::PartiallyFailed)
                | (Self::Executing, Self::Completed)
                | (Self::Executing, Self::PartiallyFailed)
        )
    }
}

impl fmt::Display for StepStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Announced => "announced",
            Self::AwaitingConsent => "awaiting consent",
            Self::Executing => "executing",
            Self::Skipped => "skipped",
            Self::Completed => "completed",
            Self::PartiallyFailed => "partially failed",
        };
        write!(f, "{}", s)
    }
}

/// Errors from invalid stage transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageTransitionError {
    #[error("Cannot transition from {from} to {to}")]
    Invalid { from: StepStage, to: StepStage },

    #[error("Cannot transition from terminal stage {from}")]
    FromTerminal { from: StepStage },
}

/// Tracks and enforces the stage progression of one step run.
#[derive(Debug)]
pub struct StepRun {
    stage: StepStage,
}

impl StepRun {
    pub fn new() -> Self {
        Self {
            stage: StepStage::Announced,
        }
    }

    pub fn stage(&self) -> StepStage {
        self.stage
    }

    pub fn advance(&mut self, to: StepStage) -> std::result::Result<(), StageTransitionError> {
        if self.stage.is_terminal() {
            return Err(StageTransitionError::FromTerminal { from: self.stage });
        }
        if !self.stage.can_transition(to) {
            return Err(StageTransitionError::Invalid {
                from: self.stage,
                to,
            });
        }
        self.stage = to;
        Ok(())
    }
}

impl Default for StepRun {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a step body needs, passed in explicitly so every dependency
/// can be a test double. Steps communicate with each other only through the
/// operating-system state they mutate, never through this context.
pub struct StepContext<'a> {
    pub console: &'a mut dyn Console,
    pub runner: &'a dyn ProcessRunner,
    pub registry: &'a mut dyn RegistryStore,
    pub config: &'a ProvisionConfig,
    /// Environment snapshot taken at startup.
    pub env: &'a HashMap<String, String>,
    pub privilege: PrivilegeLevel,
    /// Directory of the running executable (wallpaper lookup).
    pub exe_dir: PathBuf,
}

impl StepContext<'_> {
    /// Look up an environment variable, surfacing absence as the dedicated
    /// recoverable error.
    pub fn env_var(&self, name: &str) -> Result<String> {
        self.env
            .get(name)
            .cloned()
            .ok_or_else(|| ProvisionError::resource_absent(format!("environment variable {}", name)))
    }
}

/// A named provisioning unit. Implementations hold no state after execution
/// and run exactly once per program run.
pub trait Step {
    fn name(&self) -> &'static str;

    /// Description shown to the operator before the confirmation gate.
    fn description(&self, config: &ProvisionConfig) -> String;

    /// The step body: run presence detection per sub-action and apply only
    /// what is absent. Must not be called unless the operator consented.
    fn execute(&self, ctx: &mut StepContext<'_>) -> Result<Vec<ActionOutcome>>;
}

/// Result of driving one step through its state machine.
#[derive(Debug)]
pub struct StepReport {
    pub name: &'static str,
    pub outcome: StepOutcome,
    pub actions: Vec<ActionOutcome>,
}

impl StepReport {
    fn from_actions(name: &'static str, actions: Vec<ActionOutcome>) -> Self {
        let outcome = if actions.iter().any(ActionOutcome::is_failure) {
            StepOutcome::PartiallyFailed
        } else {
            StepOutcome::Completed
        };
        Self {
            name,
            outcome,
            actions,
        }
    }
}

/// Drive one step through announce → consent → execute → report.
///
/// Failure of the step never propagates: every error path terminates in a
/// `StepReport` so the orchestrator proceeds to the next step regardless.
pub fn run_step(step: &dyn Step, ctx: &mut StepContext<'_>) -> StepReport {
    let mut run = StepRun::new();

    ctx.console.section(&format!("[ {} ]", step.name()));
    run.advance(StepStage::AwaitingConsent)
        .expect("announce always precedes consent");

    let consent = ctx.console.confirm(&step.description(ctx.config));
    let consented = match consent {
        Ok(answer) => answer,
        Err(e) => {
            // NonInteractive (or a broken stdin) is fatal to this step only.
            run.advance(StepStage::PartiallyFailed)
                .expect("consent may terminate the step");
            ctx.console.error(&format!("{}", e));
            return StepReport {
                name: step.name(),
                outcome: StepOutcome::PartiallyFailed,
                actions: vec![ActionOutcome::failed("confirmation", e.to_string())],
            };
        }
    };

    if !consented {
        run.advance(StepStage::Skipped)
            .expect("consent may be declined");
        ctx.console.info("Skipped.");
        return StepReport {
            name: step.name(),
            outcome: StepOutcome::Skipped,
            actions: Vec::new(),
        };
    }

    run.advance(StepStage::Executing)
        .expect("consent precedes execution");

    let actions = match step.execute(ctx) {
        Ok(actions) => actions,
        Err(e) => {
            tracing::error!("step {} errored: {}", step.name(), e);
            vec![ActionOutcome::failed(step.name(), e.to_string())]
        }
    };

    for action in &actions {
        match action {
            ActionOutcome::AlreadySatisfied { action } => {
                ctx.console.info(&format!("{} — already in place.", action));
            }
            ActionOutcome::Applied { action } => {
                ctx.console.success(&format!("{} — done.", action));
            }
            ActionOutcome::Failed { action, reason } => {
                ctx.console.error(&format!("{} failed: {}", action, reason));
            }
            ActionOutcome::Unavailable { action, resource } => {
                ctx.console
                    .warn(&format!("{} skipped: {} not found.", action, resource));
            }
        }
    }

    let report = StepReport::from_actions(step.name(), actions);
    let terminal = match report.outcome {
        StepOutcome::Completed => StepStage::Completed,
        _ => StepStage::PartiallyFailed,
    };
    run.advance(terminal).expect("execution reaches a terminal stage");
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_happy_path() {
        let mut run = StepRun::new();
        assert_eq!(run.stage(), StepStage::Announced);
        run.advance(StepStage::AwaitingConsent).unwrap();
        run.advance(StepStage::Executing).unwrap();
        run.advance(StepStage::Completed).unwrap();
        assert!(run.stage().is_terminal());
    }

    #[test]
    fn test_stage_decline_path() {
        let mut run = StepRun::new();
        run.advance(StepStage::AwaitingConsent).unwrap();
        run.advance(StepStage::Skipped).unwrap();
        assert!(run.stage().is_terminal());
    }

    #[test]
    fn test_stage_cannot_skip_consent() {
        let mut run = StepRun::new();
        let err = run.advance(StepStage::Executing).unwrap_err();
        assert!(matches!(err, StageTransitionError::Invalid { .. }));
    }

    #[test]
    fn test_stage_terminal_is_final() {
        let mut run = StepRun::new();
        run.advance(StepStage::AwaitingConsent).unwrap();
        run.advance(StepStage::Skipped).unwrap();
        let err = run.advance(StepStage::Executing).unwrap_err();
        assert!(matches!(err, StageTransitionError::FromTerminal { .. }));
    }

    #[test]
    fn test_report_outcome_aggregation() {
        let report = StepReport::from_actions(
            "test",
            vec![
                ActionOutcome::applied("a"),
                ActionOutcome::already_satisfied("b"),
            ],
        );
        assert_eq!(report.outcome, StepOutcome::Completed);

        let report = StepReport::from_actions(
            "test",
            vec![
                ActionOutcome::applied("a"),
                ActionOutcome::failed("b", "boom"),
            ],
        );
        assert_eq!(report.outcome, StepOutcome::PartiallyFailed);
    }

    #[test]
    fn test_unavailable_is_not_failure() {
        let report = StepReport::from_actions(
            "test",
            vec![ActionOutcome::unavailable("install tool", "npm")],
        );
        assert_eq!(report.outcome, StepOutcome::Completed);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(StepOutcome::Skipped.to_string(), "skipped");
        assert_eq!(StepOutcome::PartiallyFailed.to_string(), "partially failed");
    }
}
