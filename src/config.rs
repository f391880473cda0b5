//! Provisioning configuration: what gets installed and where.
//!
//! The defaults carry the full built-in provisioning profile; a JSON file can
//! be loaded to override it, and a configured profile can be saved back out
//! for reuse on the next machine.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// An immutable (display name, package identifier) pair for one package
/// manager entry. Defined at startup, never mutated at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageEntry {
    pub name: String,
    pub id: String,
}

impl PackageEntry {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// One font to download and install (the mechanics are delegated to the
/// shell; this is just the name/url record).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontSource {
    pub name: String,
    pub url: String,
}

/// Full provisioning profile for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionConfig {
    /// Local folder that backs the SMB share.
    pub data_path: PathBuf,
    /// SMB share name (the trailing `$` keeps it hidden from browsing).
    pub share_name: String,
    /// Drive letter the share is mapped to, e.g. `R:`.
    pub drive_letter: String,
    /// Label shown in Explorer for the mapped drive.
    pub drive_label: String,
    /// Fonts installed by the fonts step.
    pub fonts: Vec<FontSource>,
    /// Winget packages installed by the software step.
    pub packages: Vec<PackageEntry>,
    /// npm-global CLI tools installed by the dev tools step.
    pub npm_tools: Vec<PackageEntry>,
    /// Directories appended to the per-user PATH.
    pub path_additions: Vec<String>,
    /// Wallpaper image filename looked up next to the executable.
    pub wallpaper_file: String,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("C:\\Data"),
            share_name: "Data$".to_string(),
            drive_letter: "R:".to_string(),
            drive_label: "Codex".to_string(),
            fonts: vec![
                FontSource {
                    name: "Nunito".to_string(),
                    url: "https://www.1001fonts.com/download/nunito.zip".to_string(),
                },
                FontSource {
                    name: "Raleway".to_string(),
                    url: "https://www.1001fonts.com/download/raleway.zip".to_string(),
                },
                FontSource {
                    name: "FiraCode".to_string(),
                    url: "https://github.com/tonsky/FiraCode/releases/download/6.2/Fira_Code_v6.2.zip"
                        .to_string(),
                },
            ],
            packages: vec![
                PackageEntry::new("AutoHotkey", "AutoHotkey.AutoHotkey"),
                PackageEntry::new("FFmpeg", "Gyan.FFmpeg"),
                PackageEntry::new("Mullvad VPN", "MullvadVPN.MullvadVPN"),
                PackageEntry::new("Obsidian", "Obsidian.Obsidian"),
                PackageEntry::new("PowerToys", "Microsoft.PowerToys"),
                PackageEntry::new("qBittorrent", "qBittorrent.qBittorrent"),
                PackageEntry::new("VS Code", "Microsoft.VisualStudioCode"),
                PackageEntry::new("Git", "Git.Git"),
                PackageEntry::new("Python", "Python.Python.3.12"),
                PackageEntry::new("Node.js", "OpenJS.NodeJS"),
            ],
            npm_tools: vec![PackageEntry::new("Gemini CLI", "@google/gemini-cli")],
            path_additions: vec!["%USERPROFILE%\\bin".to_string()],
            wallpaper_file: "background.png".to_string(),
        }
    }
}

impl ProvisionConfig {
    /// Create a configuration with the built-in defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.data_path.as_os_str().is_empty() {
            anyhow::bail!("Data path must be specified");
        }

        if self.share_name.trim().is_empty() {
            anyhow::bail!("Share name must be specified");
        }

        // Drive letter must look like "R:"
        let letter = self.drive_letter.trim_end_matches('\\');
        if letter.len() != 2
            || !letter.ends_with(':')
            || !letter.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        {
            anyhow::bail!(
                "Drive letter must be a single letter followed by a colon, got {:?}",
                self.drive_letter
            );
        }

        for pkg in &self.packages {
            if pkg.id.trim().is_empty() {
                anyhow::bail!("Package {:?} has an empty identifier", pkg.name);
            }
        }

        for dir in &self.path_additions {
            if dir.contains(';') {
                anyhow::bail!("PATH addition {:?} must not contain a semicolon", dir);
            }
        }

        Ok(())
    }
}
