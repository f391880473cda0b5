//! Winget software installation step.
//!
//! Fetches one bulk `winget list` snapshot before any install attempt and
//! checks every configured package against it, so n packages cost one
//! listing invocation instead of n. The snapshot is never refreshed
//! mid-step; each package is only checked once, so the staleness is
//! harmless.

use crate::config::ProvisionConfig;
use crate::detect::{self, InstalledSnapshot};
use crate::error::Result;
use crate::step::{ActionOutcome, Step, StepContext};

/// Installs the configured winget packages.
pub struct SoftwareStep;

impl Step for SoftwareStep {
    fn name(&self) -> &'static str {
        "Software"
    }

    fn description(&self, config: &ProvisionConfig) -> String {
        format!("Install {} packages via winget?", config.packages.len())
    }

    fn execute(&self, ctx: &mut StepContext<'_>) -> Result<Vec<ActionOutcome>> {
        if !detect::binary_on_path(ctx.runner, "winget") {
            return Ok(vec![ActionOutcome::unavailable(
                "Install software",
                "winget",
            )]);
        }

        ctx.console.info("Fetching installed package listing...");
        let snapshot = InstalledSnapshot::capture(ctx.runner)?;

        let mut actions = Vec::with_capacity(ctx.config.packages.len());
        for pkg in &ctx.config.packages {
            let action = format!("Install {}", pkg.name);
            if snapshot.contains(&pkg.id) {
                actions.push(ActionOutcome::already_satisfied(action));
                continue;
            }

            ctx.console.info(&format!("Installing {}...", pkg.name));
            let output = ctx.runner.run(
                "winget",
                &[
                    "install",
                    "-e",
                    "--id",
                    &pkg.id,
                    "--silent",
                    "--accept-source-agreements",
                    "--accept-package-agreements",
                ],
            )?;
            if output.success {
                actions.push(ActionOutcome::applied(action));
            } else {
                actions.push(ActionOutcome::failed(
                    action,
                    format!(
                        "winget exited {}: {}",
                        output.exit_code.unwrap_or(-1),
                        output.stderr.trim()
                    ),
                ));
            }
        }

        Ok(actions)
    }
}
