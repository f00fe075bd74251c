#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! `geiger` command line: run the monitor, check the setup, edit flags.

mod cli;
mod error_fmt;
mod logging;
mod run;
mod sinks;

use std::path::Path;

use clap::Parser;
use geiger_config::Config;
use geiger_core::error::GeigerError;

use crate::cli::{Cli, Commands, JSON_MODE};

/// Read and validate the config; a missing file means built-in defaults.
fn load_config(path: &Path) -> eyre::Result<Config> {
    let cfg = match std::fs::read_to_string(path) {
        Ok(text) => geiger_config::load_toml(&text)
            .map_err(|e| GeigerError::Config(format!("parse {}: {e}", path.display())))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
        Err(e) => {
            return Err(eyre::Report::new(GeigerError::Config(format!(
                "read {}: {e}",
                path.display()
            ))));
        }
    };
    cfg.validate()
        .map_err(|e| GeigerError::Config(e.to_string()))?;
    Ok(cfg)
}

fn dispatch(cli: &Cli) -> eyre::Result<()> {
    let cfg = load_config(&cli.config)?;
    logging::init(&cli.log_level, cli.json, &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), "config loaded");

    match &cli.cmd {
        Commands::Run {
            periods,
            no_console,
        } => run::run(&cfg, *periods, *no_console, cli.json),
        Commands::SelfCheck => run::self_check(&cfg),
        Commands::Flags { name, value } => run::flags(&cfg, name.as_deref(), value.as_deref()),
    }
}

fn main() {
    // Panic reports only; command errors go through error_fmt.
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = dispatch(&cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", error_fmt::format_error_json(&err));
        } else {
            eprintln!("{}", error_fmt::humanize(&err));
        }
        tracing::error!(error = %err, "command failed");
        std::process::exit(error_fmt::exit_code_for_error(&err));
    }
}
