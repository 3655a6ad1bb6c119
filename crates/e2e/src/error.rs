//! Error types for E2E testing

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Front-end not reachable at {url} after {attempts} attempts")]
    FrontendUnreachable { url: String, attempts: usize },

    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Bridge protocol error: {0}")]
    Bridge(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Scenario parse error: {0}")]
    ScenarioParse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Step failed: {step} - {reason}")]
    StepFailed { step: String, reason: String },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Data validation failed in column {column}: expected '{expected}', {} row(s) differ: {}", .mismatches.len(), RowList(.mismatches))]
    ValidationFailed {
        column: usize,
        expected: String,
        mismatches: Vec<RowMismatch>,
    },

    #[error("Download not detected: no response matching '{pattern}' within {timeout_ms} ms")]
    DownloadTimeout { pattern: String, timeout_ms: u64 },

    #[error("Response stream closed before a matching response arrived")]
    ResponseStreamClosed,

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;

/// A grid row whose filtered cell did not hold the expected value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowMismatch {
    /// 1-based row position
    pub row: usize,
    pub found: String,
}

struct RowList<'a>(&'a [RowMismatch]);

impl fmt::Display for RowList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, m) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "row {} = '{}'", m.row, m.found)?;
        }
        Ok(())
    }
}
