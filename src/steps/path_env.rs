//! Per-user PATH edit step.
//!
//! Appends the configured directories to the `Path` value under
//! `HKCU\Environment`. Membership is a case-insensitive comparison of
//! semicolon-separated entries with trailing backslashes ignored, so a
//! second run detects the existing entry and performs no write. The value is
//! written back as `REG_EXPAND_SZ` to keep `%VAR%` references expandable.
//!
//! The registry write takes effect for new shells after Explorer restarts
//! (the orchestrator's final step).

use crate::config::ProvisionConfig;
use crate::error::Result;
use crate::registry::{RegRoot, RegValue, RegistryStore};
use crate::step::{ActionOutcome, Step, StepContext};

const ENV_SUBKEY: &str = "Environment";
const PATH_VALUE: &str = "Path";

/// True when `entries` already contains `dir`, compared case-insensitively
/// with trailing separators ignored.
pub fn path_contains(path_value: &str, dir: &str) -> bool {
    let normalized = |s: &str| s.trim().trim_end_matches('\\').to_ascii_lowercase();
    let target = normalized(dir);
    path_value
        .split(';')
        .map(normalized)
        .any(|entry| entry == target)
}

/// Append `dir` to a semicolon-separated PATH string.
pub fn path_append(path_value: &str, dir: &str) -> String {
    let trimmed = path_value.trim_end_matches(';');
    if trimmed.is_empty() {
        dir.to_string()
    } else {
        format!("{};{}", trimmed, dir)
    }
}

fn read_path(registry: &dyn RegistryStore) -> Result<String> {
    Ok(
        match registry.get_value(RegRoot::CurrentUser, ENV_SUBKEY, PATH_VALUE)? {
            Some(RegValue::Sz(s)) | Some(RegValue::ExpandSz(s)) => s,
            Some(RegValue::Dword(_)) | None => String::new(),
        },
    )
}

/// Appends configured directories to the per-user PATH.
pub struct PathEditStep;

impl Step for PathEditStep {
    fn name(&self) -> &'static str {
        "PATH"
    }

    fn description(&self, config: &ProvisionConfig) -> String {
        format!(
            "Add {} to the user PATH?",
            config.path_additions.join(", ")
        )
    }

    fn execute(&self, ctx: &mut StepContext<'_>) -> Result<Vec<ActionOutcome>> {
        let mut actions = Vec::new();
        let mut path = read_path(ctx.registry)?;
        let mut changed = false;

        for dir in &ctx.config.path_additions {
            let action = format!("Add {} to PATH", dir);
            if path_contains(&path, dir) {
                actions.push(ActionOutcome::already_satisfied(action));
            } else {
                path = path_append(&path, dir);
                changed = true;
                actions.push(ActionOutcome::applied(action));
            }
        }

        // One write covers all appended directories; nothing appended means
        // nothing written.
        if changed {
            if let Err(e) = ctx.registry.set_value(
                RegRoot::CurrentUser,
                ENV_SUBKEY,
                PATH_VALUE,
                &RegValue::ExpandSz(path),
            ) {
                actions.push(ActionOutcome::failed("Write PATH", e.to_string()));
            }
        }

        Ok(actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_contains_case_insensitive() {
        let path = "C:\\Windows;C:\\Users\\x\\bin";
        assert!(path_contains(path, "c:\\users\\X\\BIN"));
        assert!(!path_contains(path, "C:\\Users\\x\\other"));
    }

    #[test]
    fn test_path_contains_ignores_trailing_backslash() {
        assert!(path_contains("C:\\tools\\;C:\\Windows", "C:\\tools"));
        assert!(path_contains("C:\\tools;C:\\Windows", "C:\\tools\\"));
    }

    #[test]
    fn test_path_contains_is_entry_wise_not_substring() {
        // "C:\bin" is a substring of "C:\bin2" but not an entry
        assert!(!path_contains("C:\\bin2", "C:\\bin"));
    }

    #[test]
    fn test_path_append() {
        assert_eq!(path_append("", "C:\\bin"), "C:\\bin");
        assert_eq!(path_append("C:\\Windows;", "C:\\bin"), "C:\\Windows;C:\\bin");
        assert_eq!(path_append("C:\\Windows", "C:\\bin"), "C:\\Windows;C:\\bin");
    }
}
