//! Taskbar pin layout step.
//!
//! Rewrites the per-user `LayoutModification.xml` under
//! `%LOCALAPPDATA%\Microsoft\Windows\Shell`. A prior file with different
//! content is preserved as `.bak` before the rewrite; identical content is a
//! no-op. The XML schema itself is opaque: the template is carried
//! verbatim and Explorer interprets it after the final restart.

use crate::config::ProvisionConfig;
use crate::error::Result;
use crate::step::{ActionOutcome, Step, StepContext};
use std::fs;
use std::path::{Path, PathBuf};

pub const LAYOUT_FILE: &str = "LayoutModification.xml";

/// Pinned-taskbar layout template applied to every provisioned machine.
pub const TASKBAR_LAYOUT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<LayoutModificationTemplate
    xmlns="http://schemas.microsoft.com/Start/2014/LayoutModification"
    xmlns:defaultlayout="http://schemas.microsoft.com/Start/2014/FullDefaultLayout"
    xmlns:taskbar="http://schemas.microsoft.com/Start/2014/TaskbarLayout"
    Version="1">
  <CustomTaskbarLayoutCollection PinListPlacement="Replace">
    <defaultlayout:TaskbarLayout>
      <taskbar:TaskbarPinList>
        <taskbar:DesktopApp DesktopApplicationLinkPath="%APPDATA%\Microsoft\Windows\Start Menu\Programs\File Explorer.lnk" />
        <taskbar:DesktopApp DesktopApplicationLinkPath="%APPDATA%\Microsoft\Windows\Start Menu\Programs\Visual Studio Code\Visual Studio Code.lnk" />
        <taskbar:DesktopApp DesktopApplicationLinkPath="%APPDATA%\Microsoft\Windows\Start Menu\Programs\Obsidian.lnk" />
      </taskbar:TaskbarPinList>
    </defaultlayout:TaskbarLayout>
  </CustomTaskbarLayoutCollection>
</LayoutModificationTemplate>
"#;

/// What `write_layout` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutWrite {
    /// Existing file already matches the template.
    Unchanged,
    /// Template written; no prior file existed.
    Written,
    /// Template written; the differing prior file was moved to `.bak`.
    WrittenWithBackup,
}

/// Write the layout template into `shell_dir`, backing up any differing
/// prior version.
pub fn write_layout(shell_dir: &Path, xml: &str) -> Result<LayoutWrite> {
    fs::create_dir_all(shell_dir)?;
    let target = shell_dir.join(LAYOUT_FILE);

    // Byte comparison: a prior file written by other tooling may be UTF-16
    // and must still be backed up, not mistaken for absent.
    let backed_up = match fs::read(&target) {
        Ok(existing) if existing == xml.as_bytes() => return Ok(LayoutWrite::Unchanged),
        Ok(_) => {
            let backup = target.with_extension("xml.bak");
            fs::rename(&target, &backup)?;
            true
        }
        Err(_) => false,
    };

    fs::write(&target, xml)?;
    Ok(if backed_up {
        LayoutWrite::WrittenWithBackup
    } else {
        LayoutWrite::Written
    })
}

/// Rewrites the taskbar pin layout.
pub struct TaskbarLayoutStep;

impl Step for TaskbarLayoutStep {
    fn name(&self) -> &'static str {
        "Taskbar Layout"
    }

    fn description(&self, _config: &ProvisionConfig) -> String {
        "Rewrite the taskbar pin layout?".to_string()
    }

    fn execute(&self, ctx: &mut StepContext<'_>) -> Result<Vec<ActionOutcome>> {
        let action = "Write taskbar layout";
        let local_appdata = match ctx.env_var("LOCALAPPDATA") {
            Ok(v) => v,
            Err(_) => {
                return Ok(vec![ActionOutcome::unavailable(action, "LOCALAPPDATA")]);
            }
        };

        let shell_dir = PathBuf::from(local_appdata)
            .join("Microsoft")
            .join("Windows")
            .join("Shell");

        match write_layout(&shell_dir, TASKBAR_LAYOUT) {
            Ok(LayoutWrite::Unchanged) => Ok(vec![ActionOutcome::already_satisfied(action)]),
            Ok(LayoutWrite::Written) => Ok(vec![ActionOutcome::applied(action)]),
            Ok(LayoutWrite::WrittenWithBackup) => {
                ctx.console.info("Previous layout saved as .bak");
                Ok(vec![ActionOutcome::applied(action)])
            }
            Err(e) => Ok(vec![ActionOutcome::failed(action, e.to_string())]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_write() {
        let dir = tempfile::tempdir().unwrap();
        let result = write_layout(dir.path(), TASKBAR_LAYOUT).unwrap();
        assert_eq!(result, LayoutWrite::Written);

        let written = fs::read_to_string(dir.path().join(LAYOUT_FILE)).unwrap();
        assert_eq!(written, TASKBAR_LAYOUT);
    }

    #[test]
    fn test_identical_content_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        write_layout(dir.path(), TASKBAR_LAYOUT).unwrap();
        let result = write_layout(dir.path(), TASKBAR_LAYOUT).unwrap();
        assert_eq!(result, LayoutWrite::Unchanged);
        assert!(!dir.path().join("LayoutModification.xml.bak").exists());
    }

    #[test]
    fn test_differing_content_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(LAYOUT_FILE), "<old/>").unwrap();

        let result = write_layout(dir.path(), TASKBAR_LAYOUT).unwrap();
        assert_eq!(result, LayoutWrite::WrittenWithBackup);

        let backup = fs::read_to_string(dir.path().join("LayoutModification.xml.bak")).unwrap();
        assert_eq!(backup, "<old/>");
        let current = fs::read_to_string(dir.path().join(LAYOUT_FILE)).unwrap();
        assert_eq!(current, TASKBAR_LAYOUT);
    }

    #[test]
    fn test_utf16_prior_file_is_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        let old: Vec<u8> = [0xFF, 0xFE]
            .into_iter()
            .chain("<old/>".encode_utf16().flat_map(u16::to_le_bytes))
            .collect();
        fs::write(dir.path().join(LAYOUT_FILE), &old).unwrap();

        let result = write_layout(dir.path(), TASKBAR_LAYOUT).unwrap();
        assert_eq!(result, LayoutWrite::WrittenWithBackup);

        let backup = fs::read(dir.path().join("LayoutModification.xml.bak")).unwrap();
        assert_eq!(backup, old);
        let current = fs::read_to_string(dir.path().join(LAYOUT_FILE)).unwrap();
        assert_eq!(current, TASKBAR_LAYOUT);
    }

    #[test]
    fn test_creates_missing_shell_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("Microsoft").join("Windows").join("Shell");
        let result = write_layout(&nested, TASKBAR_LAYOUT).unwrap();
        assert_eq!(result, LayoutWrite::Written);
    }
}
