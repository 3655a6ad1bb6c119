//! Column visibility through the grid's column picker

use std::time::Duration;

use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::{GridSelectors, Timeouts};
use crate::error::E2eResult;
use crate::grid::{ColumnSelection, GridInspector};
use crate::helpers::Common;
use crate::page::{ByRole, Locator, Page};
use crate::wait::await_spinner_hidden;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Checkbox already matched the request; nothing clicked
    AlreadyInState,
    Toggled,
    /// Hidden in the picker but the header is still rendered
    ToggledNotReflected,
}

pub struct ColumnToggler<'a> {
    page: &'a dyn Page,
    selectors: &'a GridSelectors,
    timeouts: &'a Timeouts,
}

impl<'a> ColumnToggler<'a> {
    pub fn new(page: &'a dyn Page, selectors: &'a GridSelectors, timeouts: &'a Timeouts) -> Self {
        Self {
            page,
            selectors,
            timeouts,
        }
    }

    fn checkbox(&self, label: &str) -> Locator {
        Locator::css(&self.selectors.column_picker_node)
            .has_text(label)
            .locator(Locator::css(&self.selectors.column_picker_checkbox))
            .first()
    }

    pub async fn is_checked(&self, checkbox: &Locator) -> E2eResult<bool> {
        Common::new(self.page, self.timeouts).is_checked(checkbox).await
    }

    pub async fn column_exists(&self, label: &str) -> E2eResult<bool> {
        let header = Locator::css(&self.selectors.column_header).has_text(label);
        Ok(self.page.count(&header).await? > 0)
    }

    pub async fn set_column_visibility(&self, label: &str, visible: bool) -> E2eResult<ToggleOutcome> {
        let picker = Locator::role(ByRole::new("button").name(&self.selectors.column_picker_button));
        self.page.click(&picker.first()).await?;

        let checkbox = self.checkbox(label);
        let checked = self.is_checked(&checkbox).await?;
        debug!("Column '{}' checked: {}", label, checked);

        if checked == visible {
            warn!("Column '{}' already in the requested state", label);
            return Ok(ToggleOutcome::AlreadyInState);
        }

        self.page.click(&checkbox).await?;
        if visible {
            info!("Column '{}' selected", label);
            return Ok(ToggleOutcome::Toggled);
        }
        info!("Column '{}' deselected", label);

        // The grid re-renders after the click, not with it.
        tokio::time::sleep(Duration::from_millis(self.timeouts.toggle_settle_ms)).await;
        if self.column_exists(label).await? {
            warn!(
                "Column '{}' is still rendered in the grid; the UI may not have updated yet",
                label
            );
            Ok(ToggleOutcome::ToggledNotReflected)
        } else {
            info!("Column '{}' no longer rendered", label);
            Ok(ToggleOutcome::Toggled)
        }
    }

    /// Pick a fresh random column and hide then show it again.
    ///
    /// Re-showing a column may re-render it at another position, so the
    /// selection is checked against the headers once more and re-picked if
    /// its label moved.
    pub async fn refresh_random_column<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> E2eResult<Option<ColumnSelection>> {
        await_spinner_hidden(self.page, &self.selectors.spinner, self.timeouts.spinner()).await;
        let inspector = GridInspector::new(self.page, self.selectors, self.timeouts);
        let Some(selection) = inspector.pick_fresh_column(rng, 3).await? else {
            return Ok(None);
        };
        self.set_column_visibility(&selection.label, false).await?;
        self.set_column_visibility(&selection.label, true).await?;

        let current = inspector.column_labels().await?;
        if current.get(selection.position - 1) == Some(&selection.label) {
            return Ok(Some(selection));
        }
        warn!(
            "Column '{}' moved from position {} after re-showing it, re-picking",
            selection.label, selection.position
        );
        inspector.pick_fresh_column(rng, 3).await
    }
}
