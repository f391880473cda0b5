//! Data folder, SMB share, and drive mapping step.
//!
//! Creates the local data folder, shares it over SMB, maps the configured
//! drive letter to the share, and writes the Explorer drive-label registry
//! value. Share and mapping creation have no direct native equivalent, so
//! the shell-backed manager goes through PowerShell; the step holds its
//! manager behind the `ShareManager` seam so tests can substitute a
//! recording fake. The label is a plain registry write.

use crate::config::ProvisionConfig;
use crate::detect;
use crate::error::Result;
use crate::process::ProcessRunner;
use crate::registry::{RegRoot, RegValue};
use crate::step::{ActionOutcome, Step, StepContext};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Capability seam for SMB share and drive-mapping operations.
pub trait ShareManager {
    fn create_share(
        &self,
        runner: &dyn ProcessRunner,
        name: &str,
        path: &Path,
        full_access_user: &str,
    ) -> Result<()>;

    fn map_drive(&self, runner: &dyn ProcessRunner, letter: &str, share_name: &str) -> Result<()>;
}

/// `ShareManager` delegating to `New-SmbShare` / `New-SmbMapping`.
#[derive(Debug, Default)]
pub struct SmbShareManager;

impl ShareManager for SmbShareManager {
    fn create_share(
        &self,
        runner: &dyn ProcessRunner,
        name: &str,
        path: &Path,
        full_access_user: &str,
    ) -> Result<()> {
        let script = format!(
            "New-SmbShare -Name '{}' -Path '{}' -FullAccess '{}' -Description 'Data Repository'",
            name,
            path.display(),
            full_access_user
        );
        runner.run_powershell(&script)?.ensure_success("New-SmbShare")
    }

    fn map_drive(&self, runner: &dyn ProcessRunner, letter: &str, share_name: &str) -> Result<()> {
        let script = format!(
            "New-SmbMapping -LocalPath {} -RemotePath '\\\\localhost\\{}' -Persistent $true",
            letter, share_name
        );
        runner
            .run_powershell(&script)?
            .ensure_success("New-SmbMapping")
    }
}

/// Recording fake manager for tests. Clones share the recorded state.
#[derive(Debug, Clone, Default)]
pub struct RecordingShareManager {
    shares: Arc<Mutex<Vec<(String, PathBuf)>>>,
    mappings: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingShareManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// (share name, backing path) pairs created so far.
    pub fn shares(&self) -> Vec<(String, PathBuf)> {
        self.shares
            .lock()
            .expect("RecordingShareManager mutex poisoned")
            .clone()
    }

    /// (drive letter, share name) pairs mapped so far.
    pub fn mappings(&self) -> Vec<(String, String)> {
        self.mappings
            .lock()
            .expect("RecordingShareManager mutex poisoned")
            .clone()
    }
}

impl ShareManager for RecordingShareManager {
    fn create_share(
        &self,
        _runner: &dyn ProcessRunner,
        name: &str,
        path: &Path,
        _full_access_user: &str,
    ) -> Result<()> {
        self.shares
            .lock()
            .expect("RecordingShareManager mutex poisoned")
            .push((name.to_string(), path.to_path_buf()));
        Ok(())
    }

    fn map_drive(&self, _runner: &dyn ProcessRunner, letter: &str, share_name: &str) -> Result<()> {
        self.mappings
            .lock()
            .expect("RecordingShareManager mutex poisoned")
            .push((letter.to_string(), share_name.to_string()));
        Ok(())
    }
}

/// Registry subkey Explorer reads the mapped-drive label from.
pub fn label_subkey(share_name: &str) -> String {
    format!(
        "Software\\Microsoft\\Windows\\CurrentVersion\\Explorer\\MountPoints2\\##localhost#{}",
        share_name
    )
}

/// Creates the data folder, shares it, and maps the drive letter.
pub struct ShareDriveStep {
    manager: Box<dyn ShareManager>,
}

impl ShareDriveStep {
    pub fn new() -> Self {
        Self {
            manager: Box::new(SmbShareManager),
        }
    }

    /// Build the step over a substitute manager (tests).
    pub fn with_manager(manager: Box<dyn ShareManager>) -> Self {
        Self { manager }
    }
}

impl Default for ShareDriveStep {
    fn default() -> Self {
        Self::new()
    }
}

impl Step for ShareDriveStep {
    fn name(&self) -> &'static str {
        "Share & Drive"
    }

    fn description(&self, config: &ProvisionConfig) -> String {
        format!(
            "Set up {} as share {} mapped to {}?",
            config.data_path.display(),
            config.share_name,
            config.drive_letter
        )
    }

    fn execute(&self, ctx: &mut StepContext<'_>) -> Result<Vec<ActionOutcome>> {
        let mut actions = Vec::new();

        // Share creation is a machine-wide operation.
        if !ctx.privilege.is_elevated() {
            ctx.console
                .warn("Not elevated; share creation may be denied.");
        }

        // Sub-action 1: data folder + SMB share.
        let folder_action = format!("Create and share {}", ctx.config.data_path.display());
        if detect::path_exists(&ctx.config.data_path) {
            actions.push(ActionOutcome::already_satisfied(folder_action));
        } else {
            match self.create_and_share(ctx) {
                Ok(()) => actions.push(ActionOutcome::applied(folder_action)),
                Err(e) => actions.push(ActionOutcome::failed(folder_action, e.to_string())),
            }
        }

        // Sub-action 2: drive mapping + label.
        let map_action = format!(
            "Map {} to \\\\localhost\\{}",
            ctx.config.drive_letter, ctx.config.share_name
        );
        if detect::drive_mounted(&ctx.config.drive_letter) {
            actions.push(ActionOutcome::already_satisfied(map_action));
        } else {
            match self.map_and_label(ctx) {
                Ok(()) => actions.push(ActionOutcome::applied(map_action)),
                Err(e) => actions.push(ActionOutcome::failed(map_action, e.to_string())),
            }
        }

        Ok(actions)
    }
}

impl ShareDriveStep {
    fn create_and_share(&self, ctx: &mut StepContext<'_>) -> Result<()> {
        ctx.console.info("Creating data folder...");
        fs::create_dir_all(&ctx.config.data_path)?;

        let user = ctx.env_var("USERNAME")?;
        ctx.console.info("Creating SMB share...");
        self.manager
            .create_share(ctx.runner, &ctx.config.share_name, &ctx.config.data_path, &user)
    }

    fn map_and_label(&self, ctx: &mut StepContext<'_>) -> Result<()> {
        ctx.console.info("Mapping drive...");
        self.manager
            .map_drive(ctx.runner, &ctx.config.drive_letter, &ctx.config.share_name)?;

        // Explorer shows this label instead of "\\localhost\Data$".
        ctx.registry.set_value(
            RegRoot::CurrentUser,
            &label_subkey(&ctx.config.share_name),
            "_LabelFromReg",
            &RegValue::Sz(ctx.config.drive_label.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ScriptedRunner;

    #[test]
    fn test_label_subkey_shape() {
        assert_eq!(
            label_subkey("Data$"),
            "Software\\Microsoft\\Windows\\CurrentVersion\\Explorer\\MountPoints2\\##localhost#Data$"
        );
    }

    #[test]
    fn test_smb_manager_share_command() {
        let runner = ScriptedRunner::new();
        SmbShareManager
            .create_share(&runner, "Data$", Path::new("C:\\Data"), "muzik")
            .unwrap();

        let calls = runner.invocations();
        let script = &calls[0][3];
        assert!(script.contains("New-SmbShare -Name 'Data$'"));
        assert!(script.contains("-FullAccess 'muzik'"));
    }

    #[test]
    fn test_smb_manager_mapping_is_persistent() {
        let runner = ScriptedRunner::new();
        SmbShareManager.map_drive(&runner, "R:", "Data$").unwrap();

        let calls = runner.invocations();
        let script = &calls[0][3];
        assert!(script.contains("New-SmbMapping -LocalPath R:"));
        assert!(script.contains("-Persistent $true"));
    }

    #[test]
    fn test_recording_manager_spawns_nothing() {
        let runner = ScriptedRunner::new();
        let fake = RecordingShareManager::new();
        fake.create_share(&runner, "Data$", Path::new("C:\\Data"), "muzik")
            .unwrap();
        fake.map_drive(&runner, "R:", "Data$").unwrap();

        assert_eq!(runner.spawn_count(), 0);
        assert_eq!(fake.shares()[0].0, "Data$");
        assert_eq!(fake.mappings()[0], ("R:".to_string(), "Data$".to_string()));
    }
}
