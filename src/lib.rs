//! deskforge library
//!
//! Core functionality for the interactive Windows workstation provisioning
//! tool: the step framework, the registry/process/console boundaries, and
//! the concrete provisioning steps.

pub mod cli;
pub mod config;
pub mod console;
pub mod detect;
pub mod elevation;
pub mod error;
pub mod orchestrator;
pub mod process;
pub mod registry;
pub mod snippet;
pub mod step;
pub mod steps;

// Re-export main types for convenience
pub use cli::Cli;
pub use config::{FontSource, PackageEntry, ProvisionConfig};
pub use console::{CapturedConsole, Console, TermConsole};
pub use detect::InstalledSnapshot;
pub use elevation::PrivilegeLevel;
pub use error::{ProvisionError, Result};
pub use orchestrator::Orchestrator;
pub use process::{CommandOutput, ProcessRunner, ScriptedRunner, SystemRunner};
pub use registry::{
    parse_registry_path, MemoryRegistry, RegCli, RegRoot, RegValue, RegistryStore, RegistryTarget,
};
pub use step::{
    run_step, ActionOutcome, Step, StepContext, StepOutcome, StepReport, StepRun, StepStage,
};
pub use steps::{
    DesktopIconsStep, DevToolsStep, FontsStep, PathEditStep, SettingsStep, ShareDriveStep,
    SoftwareStep, TaskbarLayoutStep,
};
