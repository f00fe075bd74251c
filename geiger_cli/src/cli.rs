//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Set once from `--json`; selects the error printer in `main`.
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "geiger", version, about = "Geiger counter monitor")]
pub struct Cli {
    /// Path to config TOML; built-in defaults when the file does not exist
    #[arg(long, value_name = "FILE", default_value = "etc/geiger_config.toml")]
    pub config: PathBuf,

    /// JSON logs on stderr; run summary and errors as JSON objects
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Count pulses and report every sampling period until Ctrl-C
    Run {
        /// Stop after this many sampling periods
        #[arg(long, value_name = "N")]
        periods: Option<u64>,
        /// Do not read console commands from stdin
        #[arg(long, action = ArgAction::SetTrue)]
        no_console: bool,
    },
    /// Validate config and open the pulse input
    SelfCheck,
    /// Show the persisted flags, or set one (`flags network on`)
    Flags {
        /// debug | network | file | display
        name: Option<String>,
        /// on | off
        value: Option<String>,
    },
}
