//! Main scenario runner

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::allure::AllureResult;
use crate::columns::ColumnToggler;
use crate::config::SuiteConfig;
use crate::download::DownloadConfirmer;
use crate::error::{E2eError, E2eResult};
use crate::helpers::Common;
use crate::i18n::Translations;
use crate::login::LoginPage;
use crate::page::{Page, PageFactory};
use crate::scenario::{Scenario, Step};
use crate::search::{GridSearchVerifier, SearchOutcome};
use crate::wait::{await_network_idle, await_spinner_hidden};

/// Result of executing a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    pub step_name: String,
    /// Unix epoch milliseconds
    pub start_ms: i64,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub success: bool,
    /// Unix epoch milliseconds
    pub start_ms: i64,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
}

/// Result of running a set of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

pub struct TestRunner {
    config: SuiteConfig,
    translations: Translations,
    factory: Arc<dyn PageFactory>,
    rng: StdRng,
}

impl TestRunner {
    pub fn new(config: SuiteConfig, translations: Translations, factory: Arc<dyn PageFactory>) -> Self {
        Self {
            config,
            translations,
            factory,
            rng: StdRng::from_entropy(),
        }
    }

    /// Make random sampling reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Run all scenarios in the scenarios directory
    pub async fn run_all(&mut self) -> E2eResult<SuiteResult> {
        let scenarios = Scenario::load_all(&self.config.scenarios_dir)?;
        self.run_scenarios(&scenarios).await
    }

    /// Run scenarios matching a tag
    pub async fn run_tagged(&mut self, tag: &str) -> E2eResult<SuiteResult> {
        let scenarios = Scenario::load_all(&self.config.scenarios_dir)?;
        let filtered: Vec<Scenario> = Scenario::filter_by_tag(&scenarios, tag)
            .into_iter()
            .cloned()
            .collect();
        self.run_scenarios(&filtered).await
    }

    /// Run a specific scenario by name
    pub async fn run_named(&mut self, name: &str) -> E2eResult<SuiteResult> {
        let scenario = Scenario::load_all(&self.config.scenarios_dir)?
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::ScenarioParse(format!("Scenario not found: {}", name)))?;
        self.run_scenarios(std::slice::from_ref(&scenario)).await
    }

    pub async fn run_scenarios(&mut self, scenarios: &[Scenario]) -> E2eResult<SuiteResult> {
        let start = Instant::now();
        let mut results = Vec::new();
        let mut passed = 0;
        let mut failed = 0;

        info!("Running {} scenario(s)...", scenarios.len());

        for scenario in scenarios {
            let result = self.run_scenario(scenario).await;
            if result.success {
                passed += 1;
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                failed += 1;
                error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }

            AllureResult::from_run(scenario, &result)
                .write_to(&self.config.output.allure_results_dir)?;
            results.push(result);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Results: {} passed, {} failed ({} ms)",
            passed, failed, duration_ms
        );

        Ok(SuiteResult {
            total: scenarios.len(),
            passed,
            failed,
            duration_ms,
            results,
        })
    }

    /// Run one scenario on a fresh page. Failures end up in the result.
    pub async fn run_scenario(&mut self, scenario: &Scenario) -> ScenarioResult {
        let start_ms = Utc::now().timestamp_millis();
        let start = Instant::now();
        debug!("Running scenario: {}", scenario.name);

        let mut steps = Vec::new();
        let mut scenario_error = None;

        match self.factory.new_page().await {
            Ok(page) => {
                let home = self.url_for("/");
                if let Err(e) = page.goto(&home).await {
                    scenario_error = Some(format!("Could not open {}: {}", home, e));
                } else {
                    for step in &scenario.steps {
                        let result = self.run_step(page.as_ref(), step).await;
                        let failed = !result.success;
                        if failed {
                            scenario_error = result.error.clone();
                        }
                        steps.push(result);
                        if failed {
                            break; // Stop on first failure
                        }
                    }
                }
                if let Err(e) = page.close().await {
                    warn!("Closing page failed: {}", e);
                }
            }
            Err(e) => scenario_error = Some(format!("Could not open page: {}", e)),
        }

        ScenarioResult {
            name: scenario.name.clone(),
            success: scenario_error.is_none(),
            start_ms,
            duration_ms: start.elapsed().as_millis() as u64,
            steps,
            error: scenario_error,
        }
    }

    async fn run_step(&mut self, page: &dyn Page, step: &Step) -> StepResult {
        let step_name = step.name();
        let start_ms = Utc::now().timestamp_millis();
        let start = Instant::now();
        debug!("Executing step: {}", step_name);

        let outcome = self.execute_step(page, step).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(()) => StepResult {
                success: true,
                step_name,
                start_ms,
                duration_ms,
                error: None,
            },
            Err(e) => StepResult {
                success: false,
                step_name,
                start_ms,
                duration_ms,
                error: Some(e.to_string()),
            },
        }
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn execute_step(&mut self, page: &dyn Page, step: &Step) -> E2eResult<()> {
        let config = &self.config;
        let timeouts = &config.timeouts;
        let common = Common::new(page, timeouts);

        match step {
            Step::Navigate { url } => page.goto(&self.url_for(url)).await,
            Step::Click { target } => page.click(&target.locator()).await,
            Step::Fill { target, value } => page.fill(&target.locator(), value).await,
            Step::Press { target, key } => page.press(&target.locator(), key).await,
            Step::Login { user, password } => {
                let user = user.as_deref().unwrap_or(&config.credentials.user);
                let password = password.as_deref().unwrap_or(&config.credentials.password);
                LoginPage::new(page, &self.translations, config.locale)
                    .login(user, password)
                    .await
            }
            Step::AssertTitle { pattern } => {
                let title = page.title().await?;
                if Regex::new(pattern)?.is_match(&title) {
                    Ok(())
                } else {
                    Err(E2eError::AssertionFailed(format!(
                        "title '{}' does not match /{}/",
                        title, pattern
                    )))
                }
            }
            Step::AssertUrl { label } => common.assert_url_matches_label(label).await,
            Step::AssertVisible { target, visible } => {
                let locator = target.locator();
                let actual = page.is_visible(&locator).await?;
                if actual == *visible {
                    Ok(())
                } else {
                    Err(E2eError::AssertionFailed(format!(
                        "expected {} to be {}",
                        locator.describe(),
                        if *visible { "visible" } else { "hidden" }
                    )))
                }
            }
            Step::WaitNetworkIdle { timeout_ms } => {
                let timeout = timeout_ms
                    .map(std::time::Duration::from_millis)
                    .unwrap_or_else(|| timeouts.network_idle());
                await_network_idle(page, timeout).await;
                Ok(())
            }
            Step::WaitSpinner => {
                await_spinner_hidden(page, &config.grid.spinner, timeouts.spinner()).await;
                Ok(())
            }
            Step::Sleep { ms } => {
                tokio::time::sleep(std::time::Duration::from_millis(*ms)).await;
                Ok(())
            }
            Step::ToggleColumn { label, visible } => {
                ColumnToggler::new(page, &config.grid, timeouts)
                    .set_column_visibility(label, *visible)
                    .await?;
                Ok(())
            }
            Step::RefreshRandomColumn => {
                let toggler = ColumnToggler::new(page, &config.grid, timeouts);
                if toggler.refresh_random_column(&mut self.rng).await?.is_none() {
                    warn!("No column available to refresh");
                }
                Ok(())
            }
            Step::SearchGrid => {
                let mut verifier = GridSearchVerifier::new(page, &config.grid, timeouts);
                match verifier.run(&mut self.rng).await? {
                    SearchOutcome::Verified { selection, rows } => {
                        info!("'{}' verified across {} rows", selection.value, rows)
                    }
                    SearchOutcome::NothingToVerify { selection } => {
                        warn!("No rows left after filtering by '{}'", selection.value)
                    }
                    SearchOutcome::NoData => warn!("Grid had no data to search"),
                }
                Ok(())
            }
            Step::SearchRandomText => {
                GridSearchVerifier::new(page, &config.grid, timeouts)
                    .search_random_text(&mut self.rng)
                    .await?;
                Ok(())
            }
            Step::ExportGrid => {
                DownloadConfirmer::new(page)
                    .export_grid(&config.export, timeouts)
                    .await?;
                Ok(())
            }
            Step::Log { message } => {
                info!("[SCENARIO LOG] {}", message);
                Ok(())
            }
        }
    }

    /// Write suite results to JSON file
    pub fn write_results(&self, results: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output.results_dir)?;

        let path = self.config.output.results_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}
