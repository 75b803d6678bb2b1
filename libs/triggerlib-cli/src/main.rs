// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! triggerlib CLI
//!
//! Hosts a trigger engine: loads configuration, attaches the event line,
//! and plays the command, configuration and read collaborators from a
//! line-oriented console.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use triggerlib::EngineConfig;

mod commands;

#[derive(Parser)]
#[command(name = "triggerlib")]
#[command(author, version, about = "Trigger-to-job dispatch engine", long_about = None)]
struct Cli {
    /// Engine configuration file (TOML)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the simulated computation delay
    #[arg(long, global = true, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the engine with an interactive console (default)
    Run {
        /// Signal that stands in for the hardware event line
        #[arg(long, default_value = "SIGUSR1")]
        event_signal: String,

        /// Do not attach the signal event line
        #[arg(long)]
        no_event_line: bool,
    },

    /// Fire each trigger source once and print the results
    Demo,
}

fn init_logging(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("Invalid log file path: {}", path.display()))?;
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(guard)
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::load_or_default(Path::new(EngineConfig::FILE_NAME)),
    };
    if let Some(delay_ms) = cli.delay_ms {
        config.computation_delay_ms = delay_ms;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.log_file.as_deref())?;
    let config = load_config(&cli)?;

    match cli.command.unwrap_or(Commands::Run {
        event_signal: "SIGUSR1".to_string(),
        no_event_line: false,
    }) {
        Commands::Run {
            event_signal,
            no_event_line,
        } => {
            let signal = if no_event_line {
                None
            } else {
                Some(commands::run::parse_signal(&event_signal)?)
            };
            commands::run::run(config, signal)
        }
        Commands::Demo => commands::demo::run(config),
    }
}
