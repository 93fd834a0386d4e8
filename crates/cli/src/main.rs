//! CRM E2E CLI - Main Entry Point
//!
//! Runs the browser scenarios against a CRM deployment, lists the catalogue,
//! prints synthetic data and shows the effective configuration.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;

use commands::{config, generate, list, run};

/// CRM end-to-end suite
#[derive(Parser)]
#[command(name = "crm-e2e")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Suite configuration file (TOML)
    #[arg(short, long, env = "CRM_E2E_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scenarios in a real browser
    Run(run::RunArgs),

    /// List the scenario catalogue
    List(list::ListArgs),

    /// Print synthetic test data
    #[command(subcommand)]
    Generate(generate::GenerateCommands),

    /// Show or validate the effective configuration
    #[command(subcommand)]
    Config(config::ConfigCommands),

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run(args) => run::execute(args, cli.config.as_deref(), cli.format).await?,
        Commands::List(args) => list::execute(args, cli.format)?,
        Commands::Generate(cmd) => generate::execute(cmd, cli.config.as_deref(), cli.format)?,
        Commands::Config(cmd) => config::execute(cmd, cli.config.as_deref(), cli.format)?,
        Commands::Version => {
            println!("CRM E2E v{}", crm_e2e_common::VERSION);
            println!("Browser flows for leads, businesses, quotes, invoices and client subscriptions");
        }
    }

    Ok(())
}
