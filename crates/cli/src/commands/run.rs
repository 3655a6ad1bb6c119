//! `wakamiti run`: execute scenarios against a live front-end

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use tracing::{info, warn};

use wakamiti_e2e::frontend::wait_until_reachable;
use wakamiti_e2e::i18n::Translations;
use wakamiti_e2e::playwright::{check_playwright_installed, PlaywrightConfig, PlaywrightFactory};
use wakamiti_e2e::{SuiteConfig, TestRunner};

use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct RunArgs {
    /// Run only scenarios carrying this tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Run only the scenario with this name
    #[arg(short, long, conflicts_with = "tag")]
    pub name: Option<String>,

    /// Front-end base URL (overrides config and WAKAMITI_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Scenarios directory
    #[arg(long)]
    pub scenarios: Option<PathBuf>,

    /// Browser to use (chromium, firefox, webkit)
    #[arg(long, default_value = "chromium")]
    pub browser: String,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Viewport width
    #[arg(long, default_value = "1280")]
    pub viewport_width: u32,

    /// Viewport height
    #[arg(long, default_value = "720")]
    pub viewport_height: u32,

    /// Directory whose node_modules provides playwright
    #[arg(long, default_value = ".")]
    pub playwright_dir: PathBuf,

    /// Seed for the random grid sampling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Do not wait for the front-end before starting
    #[arg(long)]
    pub skip_probe: bool,

    /// Seconds to wait for the front-end to answer
    #[arg(long, default_value = "30")]
    pub probe_timeout: u64,
}

/// Returns whether every scenario passed
pub async fn execute(args: RunArgs, config_path: Option<&Path>, format: OutputFormat) -> anyhow::Result<bool> {
    let mut config = SuiteConfig::load(config_path).context("loading suite configuration")?;
    if let Some(url) = args.base_url {
        config.base_url = url;
    }
    if let Some(dir) = args.scenarios {
        config.scenarios_dir = dir;
    }

    let translations = Translations::load(&config.translations_dir).with_context(|| {
        format!("loading translations from {}", config.translations_dir.display())
    })?;

    if args.skip_probe {
        warn!("Skipping front-end probe");
    } else {
        wait_until_reachable(&config.base_url, Duration::from_secs(args.probe_timeout)).await?;
    }

    check_playwright_installed().await?;
    let playwright = PlaywrightConfig {
        project_dir: args.playwright_dir,
        viewport_width: args.viewport_width,
        viewport_height: args.viewport_height,
        browser: args.browser.parse()?,
        headless: !args.headed,
        ..Default::default()
    };
    info!(
        "Running against {} with {} ({})",
        config.base_url,
        playwright.browser.as_str(),
        if playwright.headless { "headless" } else { "headed" }
    );

    let mut runner = TestRunner::new(config, translations, Arc::new(PlaywrightFactory::new(playwright)));
    if let Some(seed) = args.seed {
        info!("Using seed {}", seed);
        runner = runner.with_seed(seed);
    }

    let suite = match (&args.name, &args.tag) {
        (Some(name), _) => runner.run_named(name).await?,
        (None, Some(tag)) => runner.run_tagged(tag).await?,
        (None, None) => runner.run_all().await?,
    };
    runner.write_results(&suite)?;

    output::print_suite(&suite, format);
    Ok(suite.success())
}
