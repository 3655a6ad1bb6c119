//! Allure result files
//!
//! One `<uuid>-result.json` per scenario, in the layout `allure generate`
//! reads from its results directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::E2eResult;
use crate::runner::ScenarioResult;
use crate::scenario::Scenario;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllureStatus {
    Passed,
    Failed,
    Broken,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllureLabel {
    pub name: String,
    pub value: String,
}

impl AllureLabel {
    fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllureStep {
    pub name: String,
    pub status: AllureStatus,
    pub stage: String,
    pub status_details: StatusDetails,
    pub start: i64,
    pub stop: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllureResult {
    pub uuid: String,
    pub history_id: String,
    pub name: String,
    pub full_name: String,
    pub description: String,
    pub status: AllureStatus,
    pub status_details: StatusDetails,
    pub stage: String,
    pub start: i64,
    pub stop: i64,
    pub labels: Vec<AllureLabel>,
    pub steps: Vec<AllureStep>,
}

impl AllureResult {
    pub fn from_run(scenario: &Scenario, result: &ScenarioResult) -> Self {
        let mut labels = vec![
            AllureLabel::new("severity", scenario.severity.as_str()),
            AllureLabel::new("suite", "wakamiti-front"),
        ];
        if let Some(owner) = &scenario.owner {
            labels.push(AllureLabel::new("owner", owner.clone()));
        }
        if let Some(id) = scenario.allure_id {
            labels.push(AllureLabel::new("AS_ID", id.to_string()));
        }
        for tag in &scenario.tags {
            labels.push(AllureLabel::new("tag", tag.clone()));
        }
        for (name, value) in &scenario.labels {
            labels.push(AllureLabel::new(name, value.clone()));
        }

        let steps = result
            .steps
            .iter()
            .map(|s| AllureStep {
                name: s.step_name.clone(),
                status: if s.success {
                    AllureStatus::Passed
                } else {
                    AllureStatus::Failed
                },
                stage: "finished".to_string(),
                status_details: StatusDetails {
                    message: s.error.clone(),
                },
                start: s.start_ms,
                stop: s.start_ms + s.duration_ms as i64,
            })
            .collect();

        let status = match (&result.error, result.success) {
            (_, true) => AllureStatus::Passed,
            (Some(_), false) if result.steps.iter().any(|s| !s.success) => AllureStatus::Failed,
            _ => AllureStatus::Broken,
        };

        Self {
            uuid: Uuid::new_v4().to_string(),
            history_id: format!("wakamiti-front.{}", scenario.name),
            name: scenario.name.clone(),
            full_name: format!("wakamiti-front: {}", scenario.name),
            description: scenario.description.clone(),
            status,
            status_details: StatusDetails {
                message: result.error.clone(),
            },
            stage: "finished".to_string(),
            start: result.start_ms,
            stop: result.start_ms + result.duration_ms as i64,
            labels,
            steps,
        }
    }

    pub fn write_to(&self, dir: &Path) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}-result.json", self.uuid));
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        debug!("Allure result written to {}", path.display());
        Ok(path)
    }
}
