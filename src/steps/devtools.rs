//! npm-global developer tool step.
//!
//! Installs the configured npm CLI tools globally. npm on Windows is a
//! `.cmd` shim, so invocations go through `cmd /C`. A missing npm is a
//! skipped sub-action, not a failure.

use crate::config::ProvisionConfig;
use crate::detect;
use crate::error::Result;
use crate::step::{ActionOutcome, Step, StepContext};

/// Installs npm-global CLI tools.
pub struct DevToolsStep;

impl Step for DevToolsStep {
    fn name(&self) -> &'static str {
        "Dev Tools"
    }

    fn description(&self, config: &ProvisionConfig) -> String {
        let names: Vec<&str> = config.npm_tools.iter().map(|t| t.name.as_str()).collect();
        format!("Install developer tools via npm ({})?", names.join(", "))
    }

    fn execute(&self, ctx: &mut StepContext<'_>) -> Result<Vec<ActionOutcome>> {
        if !detect::binary_on_path(ctx.runner, "npm") {
            return Ok(vec![ActionOutcome::unavailable(
                "Install npm tools",
                "npm",
            )]);
        }

        let mut actions = Vec::with_capacity(ctx.config.npm_tools.len());
        for tool in &ctx.config.npm_tools {
            let action = format!("Install {}", tool.name);

            let listing = ctx
                .runner
                .run("cmd", &["/C", "npm", "list", "-g", &tool.id])?;
            if listing.stdout.contains(&tool.id) {
                actions.push(ActionOutcome::already_satisfied(action));
                continue;
            }

            ctx.console.info(&format!("Installing {}...", tool.name));
            let output = ctx
                .runner
                .run("cmd", &["/C", "npm", "install", "-g", &tool.id])?;
            if output.success {
                actions.push(ActionOutcome::applied(action));
            } else {
                actions.push(ActionOutcome::failed(
                    action,
                    format!("npm exited {}", output.exit_code.unwrap_or(-1)),
                ));
            }
        }

        Ok(actions)
    }
}
