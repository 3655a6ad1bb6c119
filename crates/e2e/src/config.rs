//! Suite configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::i18n::Locale;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "wakamiti-e2e.yaml";

/// Top-level suite configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Base URL of the front-end under test
    pub base_url: String,

    /// Directory with YAML scenarios
    pub scenarios_dir: PathBuf,

    /// Directory with `<locale>.json` translation files
    pub translations_dir: PathBuf,

    /// Locale used for translated labels
    pub locale: Locale,

    /// Login credentials
    pub credentials: Credentials,

    /// Grid widget selectors
    pub grid: GridSelectors,

    /// Wait budgets
    pub timeouts: Timeouts,

    /// Export endpoint contract
    pub export: ExportConfig,

    /// Output locations
    pub output: OutputConfig,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            scenarios_dir: PathBuf::from("scenarios"),
            translations_dir: PathBuf::from("i18n"),
            locale: Locale::default(),
            credentials: Credentials::default(),
            grid: GridSelectors::default(),
            timeouts: Timeouts::default(),
            export: ExportConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

/// Selectors of the grid widget contract
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSelectors {
    pub column_header: String,
    pub sample_row: String,
    pub sample_cell: String,
    pub rendered_row: String,
    /// XPath of every filter input; the 1-based column is appended as `[n]`
    pub filter_input: String,
    pub suggestion_panel: String,
    /// Suggestion option; `{value}` is replaced with the typed text
    pub suggestion_option: String,
    pub spinner: String,
    pub column_picker_button: String,
    pub column_picker_node: String,
    pub column_picker_checkbox: String,
}

impl Default for GridSelectors {
    fn default() -> Self {
        Self {
            column_header: r#"td[role="columnheader"]"#.to_string(),
            sample_row: r#"tbody[role="presentation"] tr.dx-data-row"#.to_string(),
            sample_cell: r#"td[role="gridcell"]"#.to_string(),
            rendered_row: ".dx-datagrid-rowsview .dx-row.dx-data-row".to_string(),
            filter_input: r#"//input[@aria-label="Celda de filtro"]"#.to_string(),
            suggestion_panel: r#"//div[@data-bind="dxControlsDescendantBindings: true"]"#
                .to_string(),
            suggestion_option: r#".dx-item.dx-list-item[title="{value}"]"#.to_string(),
            spinner: ".dx-loadpanel-content".to_string(),
            column_picker_button: "Columnas".to_string(),
            column_picker_node: ".dx-treeview-node".to_string(),
            column_picker_checkbox: ".dx-checkbox".to_string(),
        }
    }
}

impl GridSelectors {
    /// XPath of the filter input at a 1-based column position
    pub fn filter_input_at(&self, column: usize) -> String {
        format!("({})[{}]", self.filter_input, column)
    }

    pub fn suggestion_option_for(&self, value: &str) -> String {
        self.suggestion_option.replace("{value}", value)
    }
}

/// Wait budgets in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub network_idle_ms: u64,
    pub spinner_ms: u64,
    pub cell_visible_ms: u64,
    pub click_ready_ms: u64,
    /// Pause between an element appearing and clicking it
    pub click_settle_ms: u64,
    /// Pause before re-checking a hidden column
    pub toggle_settle_ms: u64,
    /// Pause before looking for the filter suggestion panel
    pub suggestion_settle_ms: u64,
    /// Pause before re-reading rows after committing a filter. This is the
    /// one fixed wait in the search flow before verification; set it to 0
    /// to verify as soon as the filter is committed.
    pub verify_settle_ms: u64,
    pub download_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            network_idle_ms: 5000,
            spinner_ms: 30000,
            cell_visible_ms: 5000,
            click_ready_ms: 5000,
            click_settle_ms: 1000,
            toggle_settle_ms: 500,
            suggestion_settle_ms: 2000,
            verify_settle_ms: 1000,
            download_ms: 10000,
        }
    }
}

impl Timeouts {
    /// All budgets collapsed for in-memory pages
    pub fn immediate() -> Self {
        Self {
            network_idle_ms: 50,
            spinner_ms: 50,
            cell_visible_ms: 50,
            click_ready_ms: 50,
            click_settle_ms: 0,
            toggle_settle_ms: 0,
            suggestion_settle_ms: 0,
            verify_settle_ms: 0,
            download_ms: 200,
        }
    }

    pub fn network_idle(&self) -> Duration {
        Duration::from_millis(self.network_idle_ms)
    }

    pub fn spinner(&self) -> Duration {
        Duration::from_millis(self.spinner_ms)
    }

    pub fn cell_visible(&self) -> Duration {
        Duration::from_millis(self.cell_visible_ms)
    }

    pub fn click_ready(&self) -> Duration {
        Duration::from_millis(self.click_ready_ms)
    }

    pub fn download(&self) -> Duration {
        Duration::from_millis(self.download_ms)
    }
}

/// Export endpoint contract
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub menu_text: String,
    pub format_text: String,
    pub url_fragment: String,
    pub status: u16,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            menu_text: "Exportar como".to_string(),
            format_text: "Excel".to_string(),
            url_fragment: "/proveedores-api/export-as?excelGeneratorType=DOM".to_string(),
            status: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub results_dir: PathBuf,
    pub allure_results_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("test-results"),
            allure_results_dir: PathBuf::from("allure-results"),
        }
    }
}

impl SuiteConfig {
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        serde_yaml::from_str(yaml).map_err(E2eError::from)
    }

    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load `path` if given, else the default file when present, else defaults;
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> E2eResult<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `WAKAMITI_*` overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> E2eResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("WAKAMITI_BASE_URL") {
            self.base_url = url;
        }
        if let Some(user) = lookup("WAKAMITI_USER") {
            self.credentials.user = user;
        }
        if let Some(password) = lookup("WAKAMITI_PASSWORD") {
            self.credentials.password = password;
        }
        if let Some(locale) = lookup("WAKAMITI_LOCALE") {
            self.locale = locale.parse()?;
        }
        Ok(())
    }
}
