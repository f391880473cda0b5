//! Sequential step orchestration.
//!
//! Owns the fixed, ordered list of provisioning steps and drives each one
//! through the step state machine. A partially-failed step never
//! short-circuits the run; the intended correction for any failure is
//! re-running the whole tool. After the steps, a single confirmation-gated
//! cleanup restarts the Explorer shell so registry and layout changes take
//! effect.

use crate::step::{run_step, Step, StepContext, StepOutcome, StepReport};
use crate::steps::{
    DesktopIconsStep, DevToolsStep, FontsStep, PathEditStep, SettingsStep, ShareDriveStep,
    SoftwareStep, TaskbarLayoutStep,
};
use tracing::info;

/// Runs the ordered provisioning steps and the final cleanup.
pub struct Orchestrator {
    steps: Vec<Box<dyn Step>>,
}

impl Orchestrator {
    /// The standard step order. Steps only observe each other through
    /// mutated OS state, but the order still matters to the operator:
    /// software installs before the PATH edit, everything before the
    /// Explorer restart.
    pub fn with_default_steps() -> Self {
        Self {
            steps: vec![
                Box::new(FontsStep::new()),
                Box::new(ShareDriveStep::new()),
                Box::new(SoftwareStep),
                Box::new(SettingsStep),
                Box::new(DevToolsStep),
                Box::new(PathEditStep),
                Box::new(DesktopIconsStep),
                Box::new(TaskbarLayoutStep),
            ],
        }
    }

    /// Build an orchestrator over an explicit step list (tests).
    pub fn with_steps(steps: Vec<Box<dyn Step>>) -> Self {
        Self { steps }
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Run every step in order, then print the summary. Never
    /// short-circuits: each step's report is collected whatever its outcome.
    pub fn run(&self, ctx: &mut StepContext<'_>) -> Vec<StepReport> {
        let mut reports = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            info!("running step: {}", step.name());
            let report = run_step(step.as_ref(), ctx);
            info!("step {} finished: {}", report.name, report.outcome);
            reports.push(report);
        }

        self.print_summary(ctx, &reports);
        reports
    }

    fn print_summary(&self, ctx: &mut StepContext<'_>, reports: &[StepReport]) {
        ctx.console.section("[ Summary ]");
        for report in reports {
            let line = format!("{}: {}", report.name, report.outcome);
            match report.outcome {
                StepOutcome::Completed => ctx.console.success(&line),
                StepOutcome::Skipped => ctx.console.info(&line),
                StepOutcome::PartiallyFailed => ctx.console.warn(&line),
            }
        }
    }

    /// Final cleanup: restart the Explorer shell process, exactly once,
    /// gated by its own confirmation. A declined or non-interactive
    /// confirmation leaves the shell running.
    pub fn finalize(&self, ctx: &mut StepContext<'_>) {
        let consent = ctx
            .console
            .confirm("Restart Explorer to apply all changes?")
            .unwrap_or(false);
        if !consent {
            ctx.console.info("Explorer restart skipped.");
            return;
        }

        match ctx
            .runner
            .run_powershell("Stop-Process -Name explorer -Force; Start-Process explorer")
        {
            Ok(output) if output.success => ctx.console.success("Explorer restarted."),
            Ok(output) => ctx
                .console
                .error(&format!("Explorer restart failed: {}", output.stderr.trim())),
            Err(e) => ctx.console.error(&format!("Explorer restart failed: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_step_order() {
        let orchestrator = Orchestrator::with_default_steps();
        assert_eq!(orchestrator.step_count(), 8);
    }
}
