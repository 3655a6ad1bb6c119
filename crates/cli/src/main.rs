//! Wakamiti front E2E runner

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{normalize, publish, run};

/// Wakamiti front end-to-end test runner
#[derive(Parser)]
#[command(name = "wakamiti")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Suite configuration file (defaults to ./wakamiti-e2e.yaml when present)
    #[arg(short, long, global = true)]
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

    /// Run the suite and generate the Allure report
    Publish(publish::PublishArgs),

    /// Print the normalized form of a menu label
    Normalize(normalize::NormalizeArgs),
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
        Commands::Run(args) => {
            let passed = run::execute(args, cli.config.as_deref(), cli.format).await?;
            if !passed {
                std::process::exit(1);
            }
        }
        Commands::Publish(args) => publish::execute(args).await?,
        Commands::Normalize(args) => normalize::execute(args),
    }

    Ok(())
}
