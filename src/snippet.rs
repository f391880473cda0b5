//! Text-expansion snippet scribe.
//!
//! Appends one trigger/replacement match entry to the user's espanso match
//! file under `%APPDATA%\espanso\match`. Targets `base.yml`, falling back to
//! the first existing `.yml` file, and creating `base.yml` with a bare
//! `matches:` header when none exists. espanso watches the directory and
//! reloads on its own; no process needs restarting.
//!
//! Entries are appended as text rather than going through a YAML library:
//! the file is hand-edited by the same user, and rewriting it would destroy
//! comments and formatting.

use crate::console::Console;
use crate::error::{ProvisionError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const MATCH_FILE: &str = "base.yml";
const MATCHES_HEADER: &str = "matches:\n";

/// The match directory espanso reads on this machine.
pub fn match_dir(env: &HashMap<String, String>) -> Result<PathBuf> {
    let appdata = env
        .get("APPDATA")
        .ok_or_else(|| ProvisionError::resource_absent("environment variable APPDATA"))?;
    Ok(PathBuf::from(appdata).join("espanso").join("match"))
}

/// Pick the file to append to: `base.yml` if present, otherwise the first
/// existing `.yml` file, otherwise a freshly created `base.yml`.
pub fn resolve_match_file(dir: &Path) -> Result<PathBuf> {
    let base = dir.join(MATCH_FILE);
    if base.exists() {
        return Ok(base);
    }

    let mut ymls: Vec<PathBuf> = fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "yml"))
        .collect();
    ymls.sort();
    if let Some(first) = ymls.into_iter().next() {
        return Ok(first);
    }

    fs::write(&base, MATCHES_HEADER)?;
    Ok(base)
}

/// One match entry in espanso's YAML shape. The leading newline separates it
/// from whatever the file already ends with.
pub fn render_entry(trigger: &str, replace: &str) -> String {
    format!(
        "\n  - trigger: \":{}\"\n    replace: \"{}\"\n",
        trigger, replace
    )
}

/// Append a trigger/replacement pair to `file`, writing the `matches:`
/// header first when the file is empty.
pub fn append_entry(file: &Path, trigger: &str, replace: &str) -> Result<()> {
    if fs::metadata(file)?.len() == 0 {
        fs::write(file, MATCHES_HEADER)?;
    }

    let mut content = fs::read_to_string(file)?;
    content.push_str(&render_entry(trigger, replace));
    fs::write(file, content)?;
    Ok(())
}

/// Interactive flow: prompt for a trigger and replacement, then inscribe
/// them. A missing match directory means espanso is not set up; that is a
/// reportable condition, not a reason to create dangling config.
pub fn run_scribe(console: &mut dyn Console, env: &HashMap<String, String>) -> Result<()> {
    let dir = match_dir(env)?;
    if !dir.is_dir() {
        return Err(ProvisionError::resource_absent(format!(
            "espanso match directory {} (is espanso installed?)",
            dir.display()
        )));
    }

    console.section("[ Snippet Scribe ]");
    let trigger = console.ask("Trigger (what you type):")?;
    let replace = console.ask("Replacement (what appears):")?;
    let (trigger, replace) = (trigger.trim(), replace.trim());
    if trigger.is_empty() || replace.is_empty() {
        console.warn("Empty input; nothing written.");
        return Ok(());
    }

    let file = resolve_match_file(&dir)?;
    append_entry(&file, trigger, replace)?;
    console.success(&format!(":{} added to {}", trigger, file.display()));
    console.info("espanso reloads match files automatically.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::CapturedConsole;

    fn env_with_appdata(dir: &Path) -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert(
            "APPDATA".to_string(),
            dir.to_string_lossy().into_owned(),
        );
        env
    }

    #[test]
    fn test_resolve_prefers_base() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("base.yml"), "matches:\n").unwrap();
        fs::write(dir.path().join("aaa.yml"), "matches:\n").unwrap();

        let file = resolve_match_file(dir.path()).unwrap();
        assert_eq!(file, dir.path().join("base.yml"));
    }

    #[test]
    fn test_resolve_falls_back_to_existing_yml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("custom.yml"), "matches:\n").unwrap();

        let file = resolve_match_file(dir.path()).unwrap();
        assert_eq!(file, dir.path().join("custom.yml"));
    }

    #[test]
    fn test_resolve_creates_base_with_header() {
        let dir = tempfile::tempdir().unwrap();

        let file = resolve_match_file(dir.path()).unwrap();
        assert_eq!(file, dir.path().join("base.yml"));
        assert_eq!(fs::read_to_string(&file).unwrap(), "matches:\n");
    }

    #[test]
    fn test_entry_shape() {
        assert_eq!(
            render_entry("sig", "Regards, M"),
            "\n  - trigger: \":sig\"\n    replace: \"Regards, M\"\n"
        );
    }

    #[test]
    fn test_append_preserves_existing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("base.yml");
        fs::write(&file, "matches:\n\n  - trigger: \":old\"\n    replace: \"kept\"\n").unwrap();

        append_entry(&file, "sig", "Regards, M").unwrap();

        let content = fs::read_to_string(&file).unwrap();
        assert!(content.starts_with("matches:\n"));
        assert!(content.contains("- trigger: \":old\""));
        assert!(content.contains("- trigger: \":sig\""));
    }

    #[test]
    fn test_append_writes_header_into_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("base.yml");
        fs::write(&file, "").unwrap();

        append_entry(&file, "sig", "Regards, M").unwrap();

        let content = fs::read_to_string(&file).unwrap();
        assert!(content.starts_with("matches:\n"));
        assert!(content.contains("replace: \"Regards, M\""));
    }

    #[test]
    fn test_scribe_end_to_end() {
        let appdata = tempfile::tempdir().unwrap();
        let match_path = appdata.path().join("espanso").join("match");
        fs::create_dir_all(&match_path).unwrap();

        let mut console = CapturedConsole::with_replies(&["sig", "Regards, M"]);
        run_scribe(&mut console, &env_with_appdata(appdata.path())).unwrap();

        let content = fs::read_to_string(match_path.join("base.yml")).unwrap();
        assert!(content.contains("- trigger: \":sig\""));
        assert!(console.saw("added to"));
    }

    #[test]
    fn test_scribe_rejects_empty_input() {
        let appdata = tempfile::tempdir().unwrap();
        let match_path = appdata.path().join("espanso").join("match");
        fs::create_dir_all(&match_path).unwrap();

        let mut console = CapturedConsole::with_replies(&["sig", ""]);
        run_scribe(&mut console, &env_with_appdata(appdata.path())).unwrap();

        assert!(console.saw("nothing written"));
        assert!(!match_path.join("base.yml").exists());
    }

    #[test]
    fn test_scribe_requires_match_dir() {
        let appdata = tempfile::tempdir().unwrap();

        let mut console = CapturedConsole::new();
        let err = run_scribe(&mut console, &env_with_appdata(appdata.path())).unwrap_err();
        assert!(matches!(err, ProvisionError::ResourceAbsent(_)));
    }
}
