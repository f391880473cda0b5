use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// deskforge - interactive Windows workstation provisioning
#[derive(Parser)]
#[command(name = "deskforge")]
#[command(about = "Provision a personal Windows workstation, one confirmed step at a time")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the provisioning steps (the default)
    Provision {
        /// Path to a JSON profile overriding the built-in defaults
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the effective profile to a file and exit without provisioning
        #[arg(long)]
        save_config: Option<PathBuf>,
    },
    /// Validate a profile file
    Validate {
        /// Path to the profile to validate
        config: PathBuf,
    },
    /// Add a text-expansion snippet to the espanso match file
    Snippet,
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
