//! Declarative YAML scenarios

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};
use crate::page::{ByRole, ByText, Locator};

/// A complete scenario parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name for this scenario
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering scenarios
    #[serde(default)]
    pub tags: Vec<String>,

    /// Report owner
    #[serde(default)]
    pub owner: Option<String>,

    #[serde(default)]
    pub severity: Severity,

    /// Extra report labels
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    /// Stable report id
    #[serde(default)]
    pub allure_id: Option<u32>,

    /// Steps to execute in order
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Trivial,
    Minor,
    #[default]
    Normal,
    Critical,
    Blocker,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trivial => "trivial",
            Severity::Minor => "minor",
            Severity::Normal => "normal",
            Severity::Critical => "critical",
            Severity::Blocker => "blocker",
        }
    }
}

/// What a step acts on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum Target {
    Role {
        role: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default = "default_true")]
        exact: bool,
    },
    Text {
        text: String,
        #[serde(default = "default_true")]
        exact: bool,
    },
    Css {
        selector: String,
    },
    /// `button[name=...]`
    ButtonName {
        name: String,
    },
}

fn default_true() -> bool {
    true
}

impl Target {
    /// First matching element
    pub fn locator(&self) -> Locator {
        let locator = match self {
            Target::Role { role, name, exact } => {
                let mut by = ByRole::new(role.clone()).exact(*exact);
                by.name = name.clone();
                Locator::role(by)
            }
            Target::Text { text, exact } => Locator::text(ByText::new(text.clone()).exact(*exact)),
            Target::Css { selector } => Locator::css(selector.clone()),
            Target::ButtonName { name } => Locator::css(format!("button[name={}]", name)),
        };
        locator.first()
    }
}

/// A single step in a scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Navigate to a URL (relative to base)
    Navigate { url: String },

    Click { target: Target },

    Fill { target: Target, value: String },

    Press { target: Target, key: String },

    /// Log in with the configured credentials unless given here
    Login {
        #[serde(default)]
        user: Option<String>,
        #[serde(default)]
        password: Option<String>,
    },

    /// Page title must match a regex
    AssertTitle { pattern: String },

    /// URL must contain the normalized form of a menu label
    AssertUrl { label: String },

    AssertVisible {
        target: Target,
        #[serde(default = "default_true")]
        visible: bool,
    },

    WaitNetworkIdle {
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    WaitSpinner,

    /// Wait for a fixed amount of time (use sparingly)
    Sleep { ms: u64 },

    ToggleColumn { label: String, visible: bool },

    /// Hide and re-show a random column
    RefreshRandomColumn,

    /// Filter a random cell's column by its value and verify every row
    SearchGrid,

    /// Filter a random column by a random token
    SearchRandomText,

    /// Export the grid and confirm the download response
    ExportGrid,

    /// Log a message (for debugging)
    Log { message: String },
}

impl Step {
    pub fn name(&self) -> String {
        match self {
            Step::Navigate { url } => format!("navigate:{}", url),
            Step::Click { target } => format!("click:{}", target.locator().describe()),
            Step::Fill { target, .. } => format!("fill:{}", target.locator().describe()),
            Step::Press { target, key } => format!("press:{}:{}", target.locator().describe(), key),
            Step::Login { .. } => "login".to_string(),
            Step::AssertTitle { pattern } => format!("assert-title:{}", pattern),
            Step::AssertUrl { label } => format!("assert-url:{}", label),
            Step::AssertVisible { target, visible } => {
                format!("assert-visible:{}={}", target.locator().describe(), visible)
            }
            Step::WaitNetworkIdle { .. } => "wait:network-idle".to_string(),
            Step::WaitSpinner => "wait:spinner".to_string(),
            Step::Sleep { ms } => format!("sleep:{}ms", ms),
            Step::ToggleColumn { label, visible } => format!("toggle-column:{}={}", label, visible),
            Step::RefreshRandomColumn => "refresh-random-column".to_string(),
            Step::SearchGrid => "search-grid".to_string(),
            Step::SearchRandomText => "search-random-text".to_string(),
            Step::ExportGrid => "export-grid".to_string(),
            Step::Log { message } => {
                format!("log:{}", message.chars().take(30).collect::<String>())
            }
        }
    }
}

impl Scenario {
    /// Parse a scenario from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        serde_yaml::from_str(yaml).map_err(E2eError::from)
    }

    /// Parse a file holding one scenario or a list of them
    pub fn from_file(path: &Path) -> E2eResult<Vec<Self>> {
        let content = std::fs::read_to_string(path)?;
        Self::many_from_yaml(&content)
            .map_err(|e| E2eError::ScenarioParse(format!("{}: {}", path.display(), e)))
    }

    pub fn many_from_yaml(yaml: &str) -> E2eResult<Vec<Self>> {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        if value.is_sequence() {
            Ok(serde_yaml::from_value(value)?)
        } else {
            Ok(vec![serde_yaml::from_value(value)?])
        }
    }

    /// Load all scenarios from a directory
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut scenarios = Vec::new();

        let mut paths: Vec<_> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| {
                p.extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        for path in paths {
            scenarios.extend(Self::from_file(&path)?);
        }

        Ok(scenarios)
    }

    /// Filter scenarios by tag
    pub fn filter_by_tag<'a>(scenarios: &'a [Self], tag: &str) -> Vec<&'a Self> {
        scenarios.iter().filter(|s| s.tags.iter().any(|t| t == tag)).collect()
    }
}
