//! Windows UI preference step.
//!
//! Registry toggles for Explorer behavior and the dark theme, plus the
//! wallpaper: the image next to the executable is copied into the user's
//! Pictures folder and applied through a shell-delegated
//! `SystemParametersInfo` call (SPI_SETDESKWALLPAPER has no native
//! equivalent short of FFI).

use crate::config::ProvisionConfig;
use crate::detect;
use crate::error::{ProvisionError, Result};
use crate::registry::{parse_registry_path, RegValue};
use crate::step::{ActionOutcome, Step, StepContext};
use std::fs;
use std::path::PathBuf;

/// UI preference registry writes, applied in order.
/// All are per-user (HKCU) and need no elevation.
const UI_SETTINGS: &[(&str, &str, u32)] = &[
    // Explorer
    (
        "HKCU:\\Software\\Microsoft\\Windows\\CurrentVersion\\Explorer\\Advanced",
        "ShowTaskViewButton",
        0,
    ),
    // Show hidden files
    (
        "HKCU:\\Software\\Microsoft\\Windows\\CurrentVersion\\Explorer\\Advanced",
        "Hidden",
        1,
    ),
    // Show file extensions
    (
        "HKCU:\\Software\\Microsoft\\Windows\\CurrentVersion\\Explorer\\Advanced",
        "HideFileExt",
        0,
    ),
    // Dark mode
    (
        "HKCU:\\Software\\Microsoft\\Windows\\CurrentVersion\\Themes\\Personalize",
        "AppsUseLightTheme",
        0,
    ),
    (
        "HKCU:\\Software\\Microsoft\\Windows\\CurrentVersion\\Themes\\Personalize",
        "SystemUsesLightTheme",
        0,
    ),
];

/// PowerShell wrapper around user32!SystemParametersInfo for wallpaper
/// application (SPI_SETDESKWALLPAPER = 20, update + broadcast = 3).
fn wallpaper_script(image: &std::path::Path) -> String {
    format!(
        r#"Add-Type -TypeDefinition @"
using System.Runtime.InteropServices;
public class Wallpaper {{
    [DllImport("user32.dll", CharSet = CharSet.Unicode)]
    public static extern int SystemParametersInfo(int uAction, int uParam, string lpvParam, int fuWinIni);
}}
"@
[Wallpaper]::SystemParametersInfo(20, 0, '{}', 3)"#,
        image.display()
    )
}

/// Applies UI registry preferences and the wallpaper.
pub struct SettingsStep;

impl Step for SettingsStep {
    fn name(&self) -> &'static str {
        "Settings"
    }

    fn description(&self, _config: &ProvisionConfig) -> String {
        "Apply UI preferences (dark theme, Explorer tweaks, wallpaper)?".to_string()
    }

    fn execute(&self, ctx: &mut StepContext<'_>) -> Result<Vec<ActionOutcome>> {
        let mut actions = Vec::new();

        for (path, name, value) in UI_SETTINGS {
            let (root, subkey) = parse_registry_path(path)?;
            let desired = RegValue::Dword(*value);
            let action = format!("Set {}={}", name, value);

            match detect::registry_value_matches(ctx.registry, root, &subkey, name, &desired) {
                Ok(true) => {
                    actions.push(ActionOutcome::already_satisfied(action));
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    actions.push(ActionOutcome::failed(action, e.to_string()));
                    continue;
                }
            }

            match ctx.registry.set_value(root, &subkey, name, &desired) {
                Ok(()) => actions.push(ActionOutcome::applied(action)),
                Err(e) => actions.push(ActionOutcome::failed(action, e.to_string())),
            }
        }

        actions.push(self.apply_wallpaper(ctx));
        Ok(actions)
    }
}

impl SettingsStep {
    fn apply_wallpaper(&self, ctx: &mut StepContext<'_>) -> ActionOutcome {
        let action = "Set wallpaper".to_string();
        let source = ctx.exe_dir.join(&ctx.config.wallpaper_file);
        if !detect::path_exists(&source) {
            return ActionOutcome::unavailable(action, source.display().to_string());
        }

        match self.copy_and_apply(ctx, &source) {
            Ok(()) => ActionOutcome::applied(action),
            Err(e) => ActionOutcome::failed(action, e.to_string()),
        }
    }

    fn copy_and_apply(&self, ctx: &mut StepContext<'_>, source: &std::path::Path) -> Result<()> {
        let profile = ctx.env_var("USERPROFILE")?;
        let dest = PathBuf::from(profile)
            .join("Pictures")
            .join(&ctx.config.wallpaper_file);

        ctx.console.info("Copying wallpaper to Pictures...");
        fs::copy(source, &dest)?;

        let output = ctx.runner.run_powershell(&wallpaper_script(&dest))?;
        if output.success {
            Ok(())
        } else {
            Err(ProvisionError::external_tool(format!(
                "SystemParametersInfo wrapper failed: {}",
                output.stderr.trim()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegRoot;

    #[test]
    fn test_ui_settings_are_all_per_user() {
        for (path, _, _) in UI_SETTINGS {
            let (root, _) = parse_registry_path(path).unwrap();
            assert_eq!(root, RegRoot::CurrentUser);
        }
    }

    #[test]
    fn test_wallpaper_script_embeds_path() {
        let script = wallpaper_script(std::path::Path::new("C:\\Users\\x\\Pictures\\bg.png"));
        assert!(script.contains("SystemParametersInfo(20, 0, 'C:\\Users\\x\\Pictures\\bg.png', 3)"));
    }
}
