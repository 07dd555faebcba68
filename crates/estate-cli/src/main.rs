//! # estate CLI entry point
//!
//! Parses command-line arguments, installs the tracing subscriber, and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use estate_cli::config::{load_config, run_check_config, CheckConfigArgs};
use estate_cli::demo::{run_demo, DemoArgs};
use estate_cli::scenario::{run_run, RunArgs};

/// Estate Vault CLI
///
/// Encrypted digital-inheritance vaults: scenario replay and configuration
/// checks against the transparent reference engine.
#[derive(Parser, Debug)]
#[command(name = "estate", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to a YAML engine configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bundled inheritance scenario and print its events.
    Demo(DemoArgs),

    /// Replay a YAML scenario and print the report.
    Run(RunArgs),

    /// Validate a configuration file.
    CheckConfig(CheckConfigArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    // Logs go to stderr so stdout stays machine-readable JSON.
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "estate CLI starting");

    match dispatch(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn dispatch(cli: &Cli) -> anyhow::Result<u8> {
    let config_override = cli.config.as_deref().map(load_config).transpose()?;
    match &cli.command {
        Commands::Demo(args) => run_demo(args, config_override),
        Commands::Run(args) => run_run(args, config_override),
        Commands::CheckConfig(args) => run_check_config(args),
    }
}
