//! Wakamiti front E2E toolkit
//!
//! This crate provides Rust-controlled browser tests for the Wakamiti front:
//! - Drives Playwright through a JSON-lines bridge process
//! - Samples grid data at random, filters by it and verifies every row
//! - Confirms exports by observing the download response
//! - Runs declarative YAML scenarios and writes Allure results
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Scenario Runner (Rust)                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── PageFactory::new_page() -> Arc<dyn Page>             │
//! │    ├── run_scenario(Scenario) -> ScenarioResult             │
//! │    └── AllureResult::write_to(allure-results/)              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Grid helpers (over &dyn Page)                              │
//! │    ├── wait: await_network_idle / await_spinner_hidden      │
//! │    ├── GridInspector -> GridSnapshot, Cell/ColumnSelection  │
//! │    ├── ColumnToggler::set_column_visibility                 │
//! │    ├── GridSearchVerifier::run (sample, filter, verify)     │
//! │    └── DownloadConfirmer::confirm_export                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  PlaywrightPage: node bridge, request ids, response events  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod allure;
pub mod columns;
pub mod config;
pub mod download;
pub mod error;
pub mod frontend;
pub mod grid;
pub mod helpers;
pub mod i18n;
pub mod login;
pub mod normalize;
pub mod page;
pub mod playwright;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod search;
pub mod wait;

pub use config::SuiteConfig;
pub use error::{E2eError, E2eResult};
pub use page::{Locator, Page, PageFactory};
pub use runner::TestRunner;
pub use scenario::{Scenario, Step};
