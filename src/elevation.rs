//! Privilege detection and self-elevation.
//!
//! Machine-wide writes (HKLM, SMB share creation) need administrative
//! privilege. At startup the tool checks its own privilege level and, when
//! running standard, re-invokes itself with a UAC elevation request and lets
//! the original process exit. A declined request is not fatal: the run
//! continues with reduced capability and HKLM writes surface `AccessDenied`.

use crate::error::Result;
use crate::process::ProcessRunner;
use tracing::{info, warn};

/// Whether the current process holds administrative privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivilegeLevel {
    Elevated,
    Standard,
}

impl PrivilegeLevel {
    pub fn is_elevated(self) -> bool {
        matches!(self, Self::Elevated)
    }
}

/// Detect the current privilege level.
///
/// `net session` requires administrative privilege and exits non-zero
/// without it, which makes it a dependency-free elevation probe.
pub fn detect(runner: &dyn ProcessRunner) -> PrivilegeLevel {
    match runner.run("net", &["session"]) {
        Ok(output) if output.success => PrivilegeLevel::Elevated,
        _ => PrivilegeLevel::Standard,
    }
}

/// Skip the elevation round-trip (for development and tests).
/// Set DESKFORGE_SKIP_ELEVATION=1 to skip.
pub fn should_skip_elevation() -> bool {
    std::env::var("DESKFORGE_SKIP_ELEVATION")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}

/// Re-invoke the current executable with an elevation request.
///
/// Returns `Ok(true)` when the elevated copy was launched (the caller should
/// exit), `Ok(false)` when the request was declined or failed (the caller
/// should continue unelevated).
pub fn request_elevation(runner: &dyn ProcessRunner) -> Result<bool> {
    let exe = std::env::current_exe()?;
    let script = format!("Start-Process -FilePath '{}' -Verb RunAs", exe.display());

    info!("requesting elevation via Start-Process -Verb RunAs");
    let output = runner.run_powershell(&script)?;
    if output.success {
        Ok(true)
    } else {
        warn!("elevation request declined: {}", output.stderr.trim());
        Ok(false)
    }
}
