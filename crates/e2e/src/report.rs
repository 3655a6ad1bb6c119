//! Allure report publishing
//!
//! Clean previous output, run the suite, carry the report history forward,
//! generate the report and brand it.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::process::Command;
use tracing::{error, info, warn};

use crate::error::{E2eError, E2eResult};

#[derive(Debug, Clone)]
pub struct PublishConfig {
    pub results_dir: PathBuf,
    pub history_dir: PathBuf,
    pub report_dir: PathBuf,
    pub test_results_dir: PathBuf,
    /// Command running the suite; a failing exit status is tolerated
    pub test_command: Vec<String>,
    pub allure_bin: String,
    pub report_name: String,
    pub favicon: PathBuf,
    pub iterations: usize,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("allure-results"),
            history_dir: PathBuf::from("allure-history"),
            report_dir: PathBuf::from("allure-report"),
            test_results_dir: PathBuf::from("test-results"),
            test_command: vec!["wakamiti".to_string(), "run".to_string()],
            allure_bin: "allure".to_string(),
            report_name: "Test Wakamiti front".to_string(),
            favicon: PathBuf::from("assets/favicon.ico"),
            iterations: 1,
        }
    }
}

pub struct ReportPublisher {
    config: PublishConfig,
}

impl ReportPublisher {
    pub fn new(config: PublishConfig) -> Self {
        Self { config }
    }

    /// Run every iteration; only the first one starts from a clean slate
    pub async fn publish(&self) -> E2eResult<()> {
        for iteration in 1..=self.config.iterations {
            let clean = iteration == 1;
            info!(
                "Publishing run {} of {} (clean = {})",
                iteration, self.config.iterations, clean
            );
            if clean {
                self.clean()?;
            }
            self.execute_tests().await?;
            self.copy_history()?;
            self.generate().await?;
            self.rename_report()?;
        }
        Ok(())
    }

    /// Remove previous results. This also drops the report history.
    pub fn clean(&self) -> E2eResult<()> {
        info!("Removing previous test output");
        for dir in [
            &self.config.history_dir,
            &self.config.report_dir,
            &self.config.results_dir,
            &self.config.test_results_dir,
        ] {
            match std::fs::remove_dir_all(dir) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Returns whether every test passed
    pub async fn execute_tests(&self) -> E2eResult<bool> {
        let Some((program, args)) = self.config.test_command.split_first() else {
            return Err(E2eError::Report("empty test command".to_string()));
        };
        info!("Running tests: {}", self.config.test_command.join(" "));

        let status = Command::new(program).args(args).status().await?;
        if !status.success() {
            warn!("Some tests failed ({})", status);
        }
        Ok(status.success())
    }

    /// Copy `<history>/history` into `<results>/history` when present
    pub fn copy_history(&self) -> E2eResult<bool> {
        let previous = self.config.history_dir.join("history");
        if !previous.exists() {
            info!("No previous history found");
            return Ok(false);
        }
        info!("Copying previous history");
        copy_dir(&previous, &self.config.results_dir.join("history"))?;
        Ok(true)
    }

    pub async fn generate(&self) -> E2eResult<()> {
        info!("Generating Allure report");
        let status = Command::new(&self.config.allure_bin)
            .arg("generate")
            .arg(&self.config.results_dir)
            .arg("--clean")
            .arg("-o")
            .arg(&self.config.history_dir)
            .status()
            .await?;
        if !status.success() {
            return Err(E2eError::Report(format!("allure generate exited with {}", status)));
        }
        Ok(())
    }

    /// Set `reportName` in `widgets/summary.json`, then copy the favicon
    pub fn rename_report(&self) -> E2eResult<bool> {
        let summary_path = self.config.history_dir.join("widgets").join("summary.json");
        if !summary_path.exists() {
            error!("summary.json not found at {}", summary_path.display());
            return Ok(false);
        }

        let mut summary: Value = serde_json::from_str(&std::fs::read_to_string(&summary_path)?)?;
        let Some(fields) = summary.as_object_mut() else {
            return Err(E2eError::Report("summary.json is not an object".to_string()));
        };
        fields.insert(
            "reportName".to_string(),
            Value::String(self.config.report_name.clone()),
        );
        std::fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;
        info!("Report renamed to '{}'", self.config.report_name);

        self.copy_favicon()?;
        Ok(true)
    }

    pub fn copy_favicon(&self) -> E2eResult<bool> {
        let source = &self.config.favicon;
        if !source.exists() {
            error!("favicon.ico not found at {}", source.display());
            return Ok(false);
        }
        if !self.config.history_dir.exists() {
            warn!("{} does not exist, creating it", self.config.history_dir.display());
            std::fs::create_dir_all(&self.config.history_dir)?;
        }
        let target = self.config.history_dir.join("favicon.ico");
        std::fs::copy(source, &target)?;
        info!("favicon.ico copied to {}", target.display());
        Ok(true)
    }
}

fn copy_dir(from: &Path, to: &Path) -> E2eResult<()> {
    for entry in walkdir::WalkDir::new(from) {
        let entry = entry.map_err(|e| E2eError::Report(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| E2eError::Report(e.to_string()))?;
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
