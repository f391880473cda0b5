//! Font installation step.
//!
//! Font download, archive extraction, and the Shell.Application COM copy are
//! opaque shell territory; the shell-backed installer builds one PowerShell
//! script from the configured font list and hands it to the process
//! boundary. The step holds its installer behind the `FontInstaller` seam so
//! tests can substitute a recording fake.

use crate::config::{FontSource, ProvisionConfig};
use crate::error::{ProvisionError, Result};
use crate::process::ProcessRunner;
use crate::step::{ActionOutcome, Step, StepContext};
use std::sync::{Arc, Mutex};

/// Capability seam for installing fonts.
pub trait FontInstaller {
    fn install(&self, runner: &dyn ProcessRunner, fonts: &[FontSource]) -> Result<()>;
}

/// `FontInstaller` that delegates to an ad-hoc PowerShell script using the
/// Shell.Application fonts folder (namespace 0x14).
#[derive(Debug, Default)]
pub struct ShellFontInstaller;

impl FontInstaller for ShellFontInstaller {
    fn install(&self, runner: &dyn ProcessRunner, fonts: &[FontSource]) -> Result<()> {
        let script = build_font_script(fonts);
        let output = runner.run_powershell(&script)?;
        output.ensure_success("font installation script")
    }
}

/// Recording fake installer for tests. Clones share the recorded state.
#[derive(Debug, Clone, Default)]
pub struct RecordingFontInstaller {
    installed: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingFontInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fake whose `install` always errors.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Names of every font handed to `install` so far.
    pub fn installed(&self) -> Vec<String> {
        self.installed
            .lock()
            .expect("RecordingFontInstaller mutex poisoned")
            .clone()
    }
}

impl FontInstaller for RecordingFontInstaller {
    fn install(&self, _runner: &dyn ProcessRunner, fonts: &[FontSource]) -> Result<()> {
        if self.fail {
            return Err(ProvisionError::external_tool("font installation script"));
        }
        self.installed
            .lock()
            .expect("RecordingFontInstaller mutex poisoned")
            .extend(fonts.iter().map(|f| f.name.clone()));
        Ok(())
    }
}

/// Render the download/extract/copy script for the configured fonts.
pub fn build_font_script(fonts: &[FontSource]) -> String {
    let mut entries = String::new();
    for font in fonts {
        entries.push_str(&format!("    '{}' = '{}'\n", font.name, font.url));
    }

    format!(
        r#"$ErrorActionPreference = 'Stop'
$Fonts = @{{
{entries}}}
$FontTemp = "$env:TEMP\DeskforgeFonts"
New-Item $FontTemp -ItemType Directory -Force | Out-Null
$Shell = New-Object -ComObject Shell.Application
$FontsFolder = $Shell.Namespace(0x14)

foreach ($Key in $Fonts.Keys) {{
    $Zip = "$FontTemp\$Key.zip"
    Invoke-WebRequest $Fonts[$Key] -OutFile $Zip
    Expand-Archive $Zip -Dest "$FontTemp\$Key" -Force
    $FontFiles = Get-ChildItem "$FontTemp\$Key" -Include *.ttf,*.otf -Recurse
    foreach ($File in $FontFiles) {{
        $FontsFolder.CopyHere($File.FullName, 0x14)
    }}
}}
"#,
        entries = entries
    )
}

/// Installs the configured fonts.
pub struct FontsStep {
    installer: Box<dyn FontInstaller>,
}

impl FontsStep {
    pub fn new() -> Self {
        Self {
            installer: Box::new(ShellFontInstaller),
        }
    }

    /// Build the step over a substitute installer (tests).
    pub fn with_installer(installer: Box<dyn FontInstaller>) -> Self {
        Self { installer }
    }
}

impl Default for FontsStep {
    fn default() -> Self {
        Self::new()
    }
}

impl Step for FontsStep {
    fn name(&self) -> &'static str {
        "Fonts"
    }

    fn description(&self, config: &ProvisionConfig) -> String {
        let names: Vec<&str> = config.fonts.iter().map(|f| f.name.as_str()).collect();
        format!("Install fonts ({})?", names.join(", "))
    }

    fn execute(&self, ctx: &mut StepContext<'_>) -> Result<Vec<ActionOutcome>> {
        if ctx.config.fonts.is_empty() {
            return Ok(vec![ActionOutcome::already_satisfied("Install fonts")]);
        }

        ctx.console.info("Downloading and installing fonts...");
        let action = format!("Install {} fonts", ctx.config.fonts.len());
        match self.installer.install(ctx.runner, &ctx.config.fonts) {
            Ok(()) => Ok(vec![ActionOutcome::applied(action)]),
            Err(e) => Ok(vec![ActionOutcome::failed(action, e.to_string())]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{CommandOutput, ScriptedRunner};

    fn fonts() -> Vec<FontSource> {
        vec![
            FontSource {
                name: "FiraCode".into(),
                url: "https://example.com/firacode.zip".into(),
            },
            FontSource {
                name: "Nunito".into(),
                url: "https://example.com/nunito.zip".into(),
            },
        ]
    }

    #[test]
    fn test_script_lists_every_font() {
        let script = build_font_script(&fonts());
        assert!(script.contains("'FiraCode' = 'https://example.com/firacode.zip'"));
        assert!(script.contains("'Nunito' = 'https://example.com/nunito.zip'"));
        assert!(script.contains("Namespace(0x14)"));
    }

    #[test]
    fn test_shell_installer_fails_on_nonzero_exit() {
        let runner = ScriptedRunner::new();
        runner.respond("powershell", CommandOutput::new(1, "", "download failed"));
        assert!(ShellFontInstaller.install(&runner, &fonts()).is_err());
    }

    #[test]
    fn test_recording_installer_captures_names() {
        let runner = ScriptedRunner::new();
        let fake = RecordingFontInstaller::new();
        fake.install(&runner, &fonts()).unwrap();
        assert_eq!(fake.installed(), vec!["FiraCode", "Nunito"]);
        assert_eq!(runner.spawn_count(), 0);
    }
}
