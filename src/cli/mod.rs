use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod console;

pub use console::ConsoleObserver;

#[derive(Parser)]
#[command(name = "poslauncher")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the configuration file
    #[arg(long, global = true, env = "POSLAUNCHER_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the required services, then launch the client (default)
    Run,

    /// Show the state of the required services and boot registration
    Status {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage running the launcher at boot
    Startup {
        #[command(subcommand)]
        action: StartupAction,
    },

    /// Search the known locations for the client and save the result
    Discover,

    /// Inspect or edit the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum StartupAction {
    /// Register the launcher to run at boot
    Register,
    /// Remove the boot registration
    Unregister,
    /// Report whether the launcher is registered
    Status,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the current configuration
    Show,
    /// Print the configuration file location
    Path,
    /// Set a single configuration value
    Set {
        /// Configuration key (e.g. client_executable_path)
        key: String,
        /// New value
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
}
