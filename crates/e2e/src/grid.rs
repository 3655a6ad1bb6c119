//! Grid inspection and random sampling
//!
//! Every index leaving this module is a 1-based display position, the same
//! convention the filter inputs (`(...)[n]`) and `td:nth-child(n)` use.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{GridSelectors, Timeouts};
use crate::error::E2eResult;
use crate::page::{Locator, Page};
use crate::wait::await_network_idle;

/// Column labels and row cell texts, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A sampled cell, 1-based
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSelection {
    pub value: String,
    pub row: usize,
    pub column: usize,
}

/// A sampled column, 1-based
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSelection {
    pub label: String,
    pub position: usize,
}

impl GridSnapshot {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    /// Column labels without the trailing empty-header artifact
    pub fn labelled_columns(&self) -> &[String] {
        match self.columns.last() {
            Some(last) if last.trim().is_empty() => {
                debug!("Dropping trailing empty column");
                &self.columns[..self.columns.len() - 1]
            }
            _ => &self.columns,
        }
    }

    /// Uniform pick among the labelled columns
    pub fn sample_column<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<ColumnSelection> {
        let columns = self.labelled_columns();
        if columns.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..columns.len());
        Some(ColumnSelection {
            label: columns[index].clone(),
            position: index + 1,
        })
    }

    /// Uniform row, then uniform cell excluding the trailing actions cell
    pub fn sample_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<CellSelection> {
        if self.rows.is_empty() {
            return None;
        }
        let row_index = rng.gen_range(0..self.rows.len());
        let cells = &self.rows[row_index];
        if cells.len() < 2 {
            return None;
        }
        let cell_index = rng.gen_range(0..cells.len() - 1);
        Some(CellSelection {
            value: cells[cell_index].clone(),
            row: row_index + 1,
            column: cell_index + 1,
        })
    }
}

pub struct GridInspector<'a> {
    page: &'a dyn Page,
    selectors: &'a GridSelectors,
    timeouts: &'a Timeouts,
}

impl<'a> GridInspector<'a> {
    pub fn new(page: &'a dyn Page, selectors: &'a GridSelectors, timeouts: &'a Timeouts) -> Self {
        Self {
            page,
            selectors,
            timeouts,
        }
    }

    pub async fn column_labels(&self) -> E2eResult<Vec<String>> {
        self.page
            .all_text_contents(&Locator::css(&self.selectors.column_header))
            .await
    }

    /// Read headers and every rendered row. Never cached.
    pub async fn capture_snapshot(&self) -> E2eResult<GridSnapshot> {
        let columns = self.column_labels().await?;
        let row_locator = Locator::css(&self.selectors.sample_row);
        let row_count = self.page.count(&row_locator).await?;

        let mut rows = Vec::with_capacity(row_count);
        for i in 0..row_count {
            let cells = row_locator
                .clone()
                .nth(i)
                .locator(Locator::css(&self.selectors.sample_cell));
            rows.push(self.page.all_text_contents(&cells).await?);
        }

        debug!("Captured {} columns x {} rows", columns.len(), rows.len());
        Ok(GridSnapshot { columns, rows })
    }

    pub async fn sample_random_column<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> E2eResult<Option<ColumnSelection>> {
        await_network_idle(self.page, self.timeouts.network_idle()).await;
        let snapshot = self.capture_snapshot().await?;
        let selection = snapshot.sample_column(rng);
        match &selection {
            Some(c) => info!("Random column: '{}' (position {})", c.label, c.position),
            None => warn!("No columns available to select"),
        }
        Ok(selection)
    }

    pub async fn sample_random_cell<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> E2eResult<Option<CellSelection>> {
        await_network_idle(self.page, self.timeouts.network_idle()).await;
        let snapshot = self.capture_snapshot().await?;
        let selection = snapshot.sample_cell(rng);
        match &selection {
            Some(c) => info!(
                "Random value: '{}' at row {}, column {}",
                c.value, c.row, c.column
            ),
            None => warn!("No rows or cells available to select"),
        }
        Ok(selection)
    }

    /// Pick a column and confirm its header has not moved since sampling;
    /// re-pick only when it has.
    pub async fn pick_fresh_column<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        max_attempts: usize,
    ) -> E2eResult<Option<ColumnSelection>> {
        for attempt in 1..=max_attempts {
            let Some(selection) = self.sample_random_column(rng).await? else {
                return Ok(None);
            };
            let current = self.column_labels().await?;
            if current.get(selection.position - 1) == Some(&selection.label) {
                return Ok(Some(selection));
            }
            warn!(
                "Column '{}' moved after sampling (attempt {}/{}), re-picking",
                selection.label, attempt, max_attempts
            );
        }
        Ok(None)
    }
}
