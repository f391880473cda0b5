//! deskforge - Main entry point
//!
//! An interactive, confirmation-gated provisioning tool for personal
//! Windows workstations.

use anyhow::Context;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use deskforge::cli::{Cli, Commands};
use deskforge::console::{Console, TermConsole};
use deskforge::elevation::{self, PrivilegeLevel};
use deskforge::orchestrator::Orchestrator;
use deskforge::process::SystemRunner;
use deskforge::registry::RegCli;
use deskforge::step::{StepContext, StepOutcome};
use deskforge::ProvisionConfig;

/// Initialize the logger with appropriate settings
fn init_logger() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            // RUST_LOG overrides; default keeps the console narration clean
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Main application entry point
fn main() {
    init_logger();
    info!("deskforge starting up");

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");

    let mut console = TermConsole::new();

    let result = match cli.command {
        Some(Commands::Validate { config }) => validate_profile(&config),
        Some(Commands::Snippet) => add_snippet(&mut console),
        Some(Commands::Provision {
            config,
            save_config,
        }) => run_provisioning(config, save_config, &mut console),
        None => run_provisioning(None, None, &mut console),
    };

    // Final catch-all: anything that escaped the orchestrator boundary is a
    // genuine fault. Print full context and pause so the window does not
    // vanish before the operator reads it.
    if let Err(e) = result {
        error!("fatal: {:#}", e);
        console.error(&format!("Fatal error: {:#}", e));
        let _ = console.pause("Press Enter to exit...");
        std::process::exit(1);
    }
}

/// Validate a profile file and report the result
fn validate_profile(path: &Path) -> anyhow::Result<()> {
    info!("Validating profile: {:?}", path);
    match ProvisionConfig::load_from_file(path) {
        Ok(config) => match config.validate() {
            Ok(_) => {
                println!("✓ Profile is valid: {:?}", path);
                Ok(())
            }
            Err(e) => {
                eprintln!("✗ Profile validation failed: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("✗ Failed to load profile: {}", e);
            std::process::exit(1);
        }
    }
}

/// Prompt for a trigger/replacement pair and append it to the espanso
/// match file
fn add_snippet(console: &mut TermConsole) -> anyhow::Result<()> {
    let env: HashMap<String, String> = std::env::vars().collect();
    deskforge::snippet::run_scribe(console, &env)?;
    Ok(())
}

/// Load the profile and run the full provisioning sequence
fn run_provisioning(
    config_path: Option<PathBuf>,
    save_path: Option<PathBuf>,
    console: &mut TermConsole,
) -> anyhow::Result<()> {
    let config = match &config_path {
        Some(path) => {
            info!("Loading profile: {:?}", path);
            ProvisionConfig::load_from_file(path)?
        }
        None => ProvisionConfig::default(),
    };
    config.validate().context("Profile validation failed")?;

    if let Some(path) = save_path {
        config.save_to_file(&path)?;
        println!("✓ Profile written to {:?}", path);
        println!("Run: deskforge provision --config {}", path.display());
        return Ok(());
    }

    let runner = SystemRunner;

    // Machine-wide writes need elevation; try to relaunch elevated, and
    // continue with reduced capability if the request is declined.
    let mut privilege = PrivilegeLevel::Elevated;
    if !elevation::should_skip_elevation() {
        privilege = elevation::detect(&runner);
        if privilege == PrivilegeLevel::Standard {
            console.warn("Not running as administrator.");
            if elevation::request_elevation(&runner)? {
                console.info("Elevated copy launched; closing this one.");
                std::process::exit(0);
            }
            console.warn("Continuing unelevated; machine-wide changes may be denied.");
        }
    }

    let env: HashMap<String, String> = std::env::vars().collect();
    let operator = env
        .get("USERNAME")
        .or_else(|| env.get("USER"))
        .cloned()
        .unwrap_or_else(|| "operator".to_string());

    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));

    console.banner("DESKFORGE", &operator);

    let mut registry = RegCli::new(&runner);
    let mut ctx = StepContext {
        console,
        runner: &runner,
        registry: &mut registry,
        config: &config,
        env: &env,
        privilege,
        exe_dir,
    };

    let orchestrator = Orchestrator::with_default_steps();
    let reports = orchestrator.run(&mut ctx);
    orchestrator.finalize(&mut ctx);

    let failed = reports
        .iter()
        .filter(|r| r.outcome == StepOutcome::PartiallyFailed)
        .count();
    if failed > 0 {
        info!("{} step(s) partially failed; re-run to retry", failed);
    }

    // Partial failure is still a normal completion: exit 0.
    Ok(())
}
