//! `wakamiti publish`: run the suite and build the Allure report

use std::path::PathBuf;

use clap::Args;

use wakamiti_e2e::report::{PublishConfig, ReportPublisher};

use crate::output;

#[derive(Args)]
pub struct PublishArgs {
    /// How many times to run the suite; history accumulates across runs
    #[arg(short, long, default_value = "1")]
    pub iterations: usize,

    /// Name shown in the report header
    #[arg(long, default_value = "Test Wakamiti front")]
    pub report_name: String,

    /// Allure command-line executable
    #[arg(long, default_value = "allure")]
    pub allure_bin: String,

    /// Favicon copied into the report
    #[arg(long, default_value = "assets/favicon.ico")]
    pub favicon: PathBuf,

    /// Command that runs the suite
    #[arg(last = true)]
    pub test_command: Vec<String>,
}

pub async fn execute(args: PublishArgs) -> anyhow::Result<()> {
    let defaults = PublishConfig::default();
    let config = PublishConfig {
        iterations: args.iterations.max(1),
        report_name: args.report_name,
        allure_bin: args.allure_bin,
        favicon: args.favicon,
        test_command: if args.test_command.is_empty() {
            defaults.test_command.clone()
        } else {
            args.test_command
        },
        ..defaults
    };
    let history_dir = config.history_dir.clone();

    ReportPublisher::new(config).publish().await?;
    output::print_success(&format!("Report published to {}", history_dir.display()));
    Ok(())
}
