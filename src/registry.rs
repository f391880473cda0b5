//! Registry access behind a swappable store trait.
//!
//! The real implementation delegates to `reg.exe` through the process
//! boundary: `reg add … /f` creates the subkey when absent and overwrites the
//! value unconditionally, which gives the idempotent-apply semantics every
//! settings step relies on. `reg query` reporting a missing subkey or value
//! is `Ok(None)`, not an error.
//!
//! Access denial (typically an HKLM write without elevation) is a distinct,
//! recoverable error: it is reported and the step continues.

use crate::error::{ProvisionError, Result};
use crate::process::ProcessRunner;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use strum::{Display, EnumIter, EnumString};

/// Registry root key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
pub enum RegRoot {
    /// Per-user root; writable without elevation.
    #[strum(serialize = "HKCU")]
    CurrentUser,
    /// Machine-wide root; writes require elevation.
    #[strum(serialize = "HKLM")]
    LocalMachine,
}

/// A typed registry value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegValue {
    /// 32-bit integer (`REG_DWORD`).
    Dword(u32),
    /// Plain string (`REG_SZ`).
    Sz(String),
    /// String with environment-variable references (`REG_EXPAND_SZ`).
    ExpandSz(String),
}

impl RegValue {
    /// The `reg.exe` type tag for this value.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Dword(_) => "REG_DWORD",
            Self::Sz(_) => "REG_SZ",
            Self::ExpandSz(_) => "REG_EXPAND_SZ",
        }
    }

    /// The value payload as `reg.exe` expects it on the command line.
    pub fn data_string(&self) -> String {
        match self {
            Self::Dword(v) => v.to_string(),
            Self::Sz(s) | Self::ExpandSz(s) => s.clone(),
        }
    }
}

/// A fully-qualified registry write target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryTarget {
    pub root: RegRoot,
    pub subkey: String,
    pub name: String,
}

impl RegistryTarget {
    pub fn new(root: RegRoot, subkey: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            root,
            subkey: subkey.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for RegistryTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\\{}\\{}", self.root, self.subkey, self.name)
    }
}

/// Parse a `HKCU:\Software\…` shorthand path into root and subkey.
///
/// Unknown root prefixes default to `CurrentUser`, matching the behavior of
/// the settings tables this tool was built around.
pub fn parse_registry_path(path: &str) -> Result<(RegRoot, String)> {
    let (root_str, subkey) = path
        .split_once(":\\")
        .ok_or_else(|| ProvisionError::registry(format!("Malformed registry path: {}", path)))?;
    let root = root_str.parse().unwrap_or(RegRoot::CurrentUser);
    Ok((root, subkey.to_string()))
}

/// Read/write access to a single named value under a root+subkey path.
///
/// `set_value` must create the subkey when absent and overwrite existing
/// values unconditionally. `get_value` returns `Ok(None)` when the subkey or
/// value does not exist.
pub trait RegistryStore {
    fn set_value(
        &mut self,
        root: RegRoot,
        subkey: &str,
        name: &str,
        value: &RegValue,
    ) -> Result<()>;

    fn get_value(&self, root: RegRoot, subkey: &str, name: &str) -> Result<Option<RegValue>>;
}

/// `RegistryStore` implemented over `reg.exe`.
pub struct RegCli<'a> {
    runner: &'a dyn ProcessRunner,
}

impl<'a> RegCli<'a> {
    pub fn new(runner: &'a dyn ProcessRunner) -> Self {
        Self { runner }
    }
}

impl RegistryStore for RegCli<'_> {
    fn set_value(
        &mut self,
        root: RegRoot,
        subkey: &str,
        name: &str,
        value: &RegValue,
    ) -> Result<()> {
        let key = format!("{}\\{}", root, subkey);
        let data = value.data_string();
        let output = self.runner.run(
            "reg",
            &[
                "add",
                &key,
                "/v",
                name,
                "/t",
                value.type_tag(),
                "/d",
                &data,
                "/f",
            ],
        )?;

        if output.success {
            return Ok(());
        }
        let stderr = output.stderr.trim();
        if stderr.to_ascii_lowercase().contains("denied") {
            Err(ProvisionError::access_denied(format!("{}\\{}", key, name)))
        } else {
            Err(ProvisionError::registry(format!(
                "reg add {} failed: {}",
                key, stderr
            )))
        }
    }

    fn get_value(&self, root: RegRoot, subkey: &str, name: &str) -> Result<Option<RegValue>> {
        let key = format!("{}\\{}", root, subkey);
        let output = self.runner.run("reg", &["query", &key, "/v", name])?;
        if !output.success {
            // Missing subkey or value is absence, not failure.
            return Ok(None);
        }
        Ok(parse_query_output(&output.stdout, name))
    }
}

/// Extract the named value from `reg query` output.
///
/// The payload line has the shape `    Name    REG_DWORD    0x1`.
fn parse_query_output(stdout: &str, name: &str) -> Option<RegValue> {
    for line in stdout.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix(name) else {
            continue;
        };
        let mut fields = rest.split_whitespace();
        let type_tag = fields.next()?;
        let data = fields.collect::<Vec<_>>().join(" ");
        return match type_tag {
            "REG_DWORD" => {
                let hex = data.trim_start_matches("0x");
                u32::from_str_radix(hex, 16).ok().map(RegValue::Dword)
            }
            "REG_SZ" => Some(RegValue::Sz(data)),
            "REG_EXPAND_SZ" => Some(RegValue::ExpandSz(data)),
            _ => None,
        };
    }
    None
}

/// In-memory `RegistryStore` fake for tests.
///
/// Keys are case-insensitive like the real registry. Roots can be marked
/// denied to simulate an unelevated HKLM write.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    values: HashMap<String, RegValue>,
    denied: HashSet<RegRoot>,
    writes: usize,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate missing write privilege on a root.
    pub fn deny_writes(&mut self, root: RegRoot) {
        self.denied.insert(root);
    }

    /// Number of successful writes performed.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    fn key(root: RegRoot, subkey: &str, name: &str) -> String {
        format!("{}\\{}\\{}", root, subkey, name).to_ascii_lowercase()
    }
}

impl RegistryStore for MemoryRegistry {
    fn set_value(
        &mut self,
        root: RegRoot,
        subkey: &str,
        name: &str,
        value: &RegValue,
    ) -> Result<()> {
        if self.denied.contains(&root) {
            return Err(ProvisionError::access_denied(format!(
                "{}\\{}\\{}",
                root, subkey, name
            )));
        }
        self.values
            .insert(Self::key(root, subkey, name), value.clone());
        self.writes += 1;
        Ok(())
    }

    fn get_value(&self, root: RegRoot, subkey: &str, name: &str) -> Result<Option<RegValue>> {
        Ok(self.values.get(&Self::key(root, subkey, name)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{CommandOutput, ScriptedRunner};

    #[test]
    fn test_parse_registry_path_hkcu() {
        let (root, subkey) =
            parse_registry_path("HKCU:\\Software\\Microsoft\\Windows").unwrap();
        assert_eq!(root, RegRoot::CurrentUser);
        assert_eq!(subkey, "Software\\Microsoft\\Windows");
    }

    #[test]
    fn test_parse_registry_path_hklm() {
        let (root, _) = parse_registry_path("HKLM:\\Software").unwrap();
        assert_eq!(root, RegRoot::LocalMachine);
    }

    #[test]
    fn test_parse_registry_path_malformed() {
        assert!(parse_registry_path("Software\\Microsoft").is_err());
    }

    #[test]
    fn test_parse_query_output_dword() {
        let stdout = "\r\nHKEY_CURRENT_USER\\Software\\Test\r\n    Hidden    REG_DWORD    0x1\r\n";
        assert_eq!(
            parse_query_output(stdout, "Hidden"),
            Some(RegValue::Dword(1))
        );
    }

    #[test]
    fn test_parse_query_output_expand_sz() {
        let stdout = "\r\nHKEY_CURRENT_USER\\Environment\r\n    Path    REG_EXPAND_SZ    C:\\bin;%USERPROFILE%\\tools\r\n";
        assert_eq!(
            parse_query_output(stdout, "Path"),
            Some(RegValue::ExpandSz("C:\\bin;%USERPROFILE%\\tools".into()))
        );
    }

    #[test]
    fn test_reg_cli_builds_add_command() {
        let runner = ScriptedRunner::new();
        let mut reg = RegCli::new(&runner);
        reg.set_value(
            RegRoot::CurrentUser,
            "Software\\Test",
            "Hidden",
            &RegValue::Dword(1),
        )
        .unwrap();

        let calls = runner.invocations();
        assert_eq!(
            calls[0],
            vec![
                "reg",
                "add",
                "HKCU\\Software\\Test",
                "/v",
                "Hidden",
                "/t",
                "REG_DWORD",
                "/d",
                "1",
                "/f"
            ]
        );
    }

    #[test]
    fn test_reg_cli_maps_denied_stderr() {
        let runner = ScriptedRunner::new();
        runner.respond("reg", CommandOutput::new(1, "", "ERROR: Access is denied.\r\n"));
        let mut reg = RegCli::new(&runner);
        let err = reg
            .set_value(
                RegRoot::LocalMachine,
                "Software\\Test",
                "Flag",
                &RegValue::Dword(1),
            )
            .unwrap_err();
        assert!(matches!(err, ProvisionError::AccessDenied(_)));
    }

    #[test]
    fn test_reg_cli_missing_value_is_none() {
        let runner = ScriptedRunner::new();
        runner.respond(
            "reg",
            CommandOutput::new(1, "", "ERROR: The system was unable to find the specified registry key or value.\r\n"),
        );
        let reg = RegCli::new(&runner);
        let value = reg
            .get_value(RegRoot::CurrentUser, "Software\\Missing", "Nope")
            .unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_memory_registry_case_insensitive() {
        let mut reg = MemoryRegistry::new();
        reg.set_value(
            RegRoot::CurrentUser,
            "Software\\Test",
            "Hidden",
            &RegValue::Dword(1),
        )
        .unwrap();

        let value = reg
            .get_value(RegRoot::CurrentUser, "SOFTWARE\\test", "hidden")
            .unwrap();
        assert_eq!(value, Some(RegValue::Dword(1)));
    }

    #[test]
    fn test_memory_registry_denied_root() {
        let mut reg = MemoryRegistry::new();
        reg.deny_writes(RegRoot::LocalMachine);

        let err = reg
            .set_value(RegRoot::LocalMachine, "Software", "Flag", &RegValue::Dword(1))
            .unwrap_err();
        assert!(matches!(err, ProvisionError::AccessDenied(_)));

        // HKCU is unaffected
        reg.set_value(RegRoot::CurrentUser, "Software", "Flag", &RegValue::Dword(1))
            .unwrap();
    }
}
