//! Randomized grid search-and-verify workflow
//!
//! ```text
//! Idle -> Sampling -> Filtering -> FilterApplied -> Verifying -> Verified
//!            |                                          |-----> Mismatch (error)
//!            +-> NoData                                 +-----> NothingToVerify
//! ```
//!
//! Columns are 1-based display positions end to end.

use std::time::Duration;

use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{debug, error, info, warn};

use crate::config::{GridSelectors, Timeouts};
use crate::error::{E2eError, E2eResult, RowMismatch};
use crate::grid::{CellSelection, GridInspector};
use crate::page::{Locator, Page, WaitState};
use crate::wait::await_network_idle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Sampling,
    Filtering,
    FilterApplied,
    Verifying,
    Verified,
    Mismatch,
    NoData,
    NothingToVerify,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The grid had nothing to sample
    NoData,
    /// Every rendered row holds the sampled value in the filtered column
    Verified { selection: CellSelection, rows: usize },
    /// The filter left no rows at all
    NothingToVerify { selection: CellSelection },
}

pub struct GridSearchVerifier<'a> {
    page: &'a dyn Page,
    selectors: &'a GridSelectors,
    timeouts: &'a Timeouts,
    state: SearchState,
}

impl<'a> GridSearchVerifier<'a> {
    pub fn new(page: &'a dyn Page, selectors: &'a GridSelectors, timeouts: &'a Timeouts) -> Self {
        Self {
            page,
            selectors,
            timeouts,
            state: SearchState::Idle,
        }
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    fn transition(&mut self, next: SearchState) {
        debug!("Grid search: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Sample a random cell, filter its column by its value and check every
    /// remaining row.
    pub async fn run<R: Rng + ?Sized>(&mut self, rng: &mut R) -> E2eResult<SearchOutcome> {
        self.transition(SearchState::Sampling);
        let inspector = GridInspector::new(self.page, self.selectors, self.timeouts);
        let Some(selection) = inspector.sample_random_cell(rng).await? else {
            warn!("Could not pick a random value from the grid");
            self.transition(SearchState::NoData);
            return Ok(SearchOutcome::NoData);
        };

        self.transition(SearchState::Filtering);
        self.apply_filter(&selection.value, selection.column).await?;
        self.transition(SearchState::FilterApplied);

        self.transition(SearchState::Verifying);
        tokio::time::sleep(Duration::from_millis(self.timeouts.verify_settle_ms)).await;
        match self.verify_column(&selection.value, selection.column).await {
            Ok(0) => {
                warn!("Filter on '{}' left no rows to verify", selection.value);
                self.transition(SearchState::NothingToVerify);
                Ok(SearchOutcome::NothingToVerify { selection })
            }
            Ok(rows) => {
                self.transition(SearchState::Verified);
                Ok(SearchOutcome::Verified { selection, rows })
            }
            Err(e) => {
                if matches!(e, E2eError::ValidationFailed { .. }) {
                    self.transition(SearchState::Mismatch);
                }
                Err(e)
            }
        }
    }

    /// Type `value` into the filter of the 1-based `column` and commit it
    pub async fn apply_filter(&self, value: &str, column: usize) -> E2eResult<()> {
        await_network_idle(self.page, self.timeouts.network_idle()).await;

        let input = Locator::css(self.selectors.filter_input_at(column));
        if self.page.count(&input).await? == 0 {
            return Err(E2eError::ElementNotFound(format!(
                "filter input for column {}",
                column
            )));
        }

        self.page.fill(&input, value).await?;
        self.select_suggestion(value).await;
        self.page.press(&input, "Enter").await?;
        info!("Filtered column {} by '{}'", column, value);
        Ok(())
    }

    /// Click the matching entry of the suggestion dropdown when one shows up.
    /// Returns whether an option was clicked.
    pub async fn select_suggestion(&self, value: &str) -> bool {
        tokio::time::sleep(Duration::from_millis(self.timeouts.suggestion_settle_ms)).await;
        match self.try_select_suggestion(value).await {
            Ok(clicked) => clicked,
            Err(e) => {
                warn!("Suggestion selection failed: {}", e);
                false
            }
        }
    }

    async fn try_select_suggestion(&self, value: &str) -> E2eResult<bool> {
        let panel = Locator::css(&self.selectors.suggestion_panel);
        if !self.page.is_visible(&panel).await? {
            debug!("No suggestion dropdown shown");
            return Ok(false);
        }
        let option = Locator::css(self.selectors.suggestion_option_for(value));
        if self.page.count(&option).await? == 0 {
            warn!("Suggestion '{}' not found", value);
            return Ok(false);
        }
        info!("Suggestion '{}' found, clicking", value);
        self.page.click(&option.first()).await?;
        Ok(true)
    }

    /// Check the 1-based `column` of every rendered row against `expected`.
    /// Returns how many rows were checked.
    pub async fn verify_column(&self, expected: &str, column: usize) -> E2eResult<usize> {
        let expected = expected.trim();
        let rows = Locator::css(&self.selectors.rendered_row);
        let row_count = self.page.count(&rows).await?;
        info!(
            "Checking column {} for '{}' across {} rows",
            column, expected, row_count
        );

        let mut mismatches = Vec::new();
        for i in 0..row_count {
            let cell = rows
                .clone()
                .nth(i)
                .locator(Locator::css(format!("td:nth-child({})", column)));
            self.page
                .wait_for(&cell, WaitState::Visible, self.timeouts.cell_visible())
                .await?;
            let text = self.page.text_content(&cell).await?.unwrap_or_default();
            let found = text.trim();

            if found == expected {
                debug!("Row {}: '{}'", i + 1, found);
            } else {
                error!("Mismatch at row {}: expected '{}', found '{}'", i + 1, expected, found);
                mismatches.push(RowMismatch {
                    row: i + 1,
                    found: found.to_string(),
                });
            }
        }

        if !mismatches.is_empty() {
            return Err(E2eError::ValidationFailed {
                column,
                expected: expected.to_string(),
                mismatches,
            });
        }
        info!("All {} rows match '{}'", row_count, expected);
        Ok(row_count)
    }

    /// Filter a freshly picked column by a random token. Nothing is verified.
    pub async fn search_random_text<R: Rng + ?Sized>(&self, rng: &mut R) -> E2eResult<Option<String>> {
        await_network_idle(self.page, self.timeouts.network_idle()).await;
        let inspector = GridInspector::new(self.page, self.selectors, self.timeouts);
        let Some(column) = inspector.pick_fresh_column(rng, 3).await? else {
            warn!("Could not pick a random column");
            return Ok(None);
        };

        let token: String = (0..13)
            .map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_lowercase())
            .collect();
        self.apply_filter(&token, column.position).await?;
        Ok(Some(token))
    }
}
