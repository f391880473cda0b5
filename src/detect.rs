//! Side-effect-free presence predicates.
//!
//! Each provisioning sub-action consults one of these before applying a
//! change; an already-satisfied condition means no external action occurs.
//! All predicates are pure reads and can be called repeatedly without
//! changing system state.

use crate::error::Result;
use crate::process::ProcessRunner;
use crate::registry::{RegRoot, RegValue, RegistryStore};
use std::path::Path;

/// Filesystem path existence (also covers mounted drive letters, e.g. `R:\`).
pub fn path_exists(path: &Path) -> bool {
    path.exists()
}

/// Whether a drive letter such as `R:` is currently mounted.
pub fn drive_mounted(letter: &str) -> bool {
    Path::new(&format!("{}\\", letter.trim_end_matches('\\'))).exists()
}

/// Whether `name` resolves through the process search path.
///
/// Uses `where` (the Windows counterpart of `which`); a lookup miss exits
/// non-zero, which maps to `false` rather than an error.
pub fn binary_on_path(runner: &dyn ProcessRunner, name: &str) -> bool {
    runner
        .run("where", &[name])
        .map(|output| output.success)
        .unwrap_or(false)
}

/// Whether a registry value exists and equals the expected content.
pub fn registry_value_matches(
    registry: &dyn RegistryStore,
    root: RegRoot,
    subkey: &str,
    name: &str,
    expected: &RegValue,
) -> Result<bool> {
    Ok(registry.get_value(root, subkey, name)?.as_ref() == Some(expected))
}

/// A bulk listing of installed package identifiers, fetched once per run.
///
/// Membership is a plain substring search over the listing text, not an
/// exact field match: an identifier that is a substring of another installed
/// identifier (`Git` inside `Git.Git`) will false-positive. Accepted in
/// exchange for one listing invocation instead of one per package. Each
/// package is only checked once per run, so the snapshot is never refreshed
/// mid-step.
#[derive(Debug, Clone)]
pub struct InstalledSnapshot {
    listing: String,
}

impl InstalledSnapshot {
    /// Capture the snapshot via `winget list`. The winget invocation itself
    /// failing yields an empty snapshot (every package then looks absent and
    /// gets an install attempt, which winget resolves idempotently).
    pub fn capture(runner: &dyn ProcessRunner) -> Result<Self> {
        let output = runner.run("winget", &["list", "--accept-source-agreements"])?;
        if !output.success {
            tracing::warn!("winget list exited non-zero; treating listing as empty");
            return Ok(Self {
                listing: String::new(),
            });
        }
        Ok(Self {
            listing: output.stdout,
        })
    }

    /// Build a snapshot from raw listing text (tests, cached output).
    pub fn from_listing(listing: impl Into<String>) -> Self {
        Self {
            listing: listing.into(),
        }
    }

    /// Substring membership check (see type docs for the caveat).
    pub fn contains(&self, package_id: &str) -> bool {
        self.listing.contains(package_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{CommandOutput, ScriptedRunner};
    use crate::registry::MemoryRegistry;

    #[test]
    fn test_snapshot_substring_semantics() {
        let snapshot = InstalledSnapshot::from_listing(
            "Name        Id             Version\nGit         Git.Git        2.45.0\n",
        );
        assert!(snapshot.contains("Git.Git"));
        assert!(!snapshot.contains("Got.Git"));
        // Documented caveat: bare "Git" matches inside "Git.Git"
        assert!(snapshot.contains("Git"));
    }

    #[test]
    fn test_snapshot_capture_failure_is_empty() {
        let runner = ScriptedRunner::new();
        runner.respond("winget", CommandOutput::new(1, "", "no sources"));
        let snapshot = InstalledSnapshot::capture(&runner).unwrap();
        assert!(!snapshot.contains("Git.Git"));
    }

    #[test]
    fn test_binary_on_path_miss() {
        let runner = ScriptedRunner::new();
        runner.respond("where", CommandOutput::new(1, "", ""));
        assert!(!binary_on_path(&runner, "npm"));
        // Default scripted response is success
        assert!(binary_on_path(&runner, "winget"));
    }

    #[test]
    fn test_registry_value_matches_is_pure() {
        let mut reg = MemoryRegistry::new();
        reg.set_value(
            RegRoot::CurrentUser,
            "Software\\Test",
            "Hidden",
            &RegValue::Dword(1),
        )
        .unwrap();

        let expected = RegValue::Dword(1);
        let first =
            registry_value_matches(&reg, RegRoot::CurrentUser, "Software\\Test", "Hidden", &expected)
                .unwrap();
        let second =
            registry_value_matches(&reg, RegRoot::CurrentUser, "Software\\Test", "Hidden", &expected)
                .unwrap();
        // Idempotent read: same answer twice with no intervening write
        assert!(first && second);
        assert_eq!(reg.write_count(), 1);
    }

    #[test]
    fn test_registry_value_mismatch() {
        let mut reg = MemoryRegistry::new();
        reg.set_value(
            RegRoot::CurrentUser,
            "Software\\Test",
            "Hidden",
            &RegValue::Dword(0),
        )
        .unwrap();

        let matches = registry_value_matches(
            &reg,
            RegRoot::CurrentUser,
            "Software\\Test",
            "Hidden",
            &RegValue::Dword(1),
        )
        .unwrap();
        assert!(!matches);
    }
}
