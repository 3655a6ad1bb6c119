//! Generic page helpers shared by scenarios and page objects

use std::time::Duration;

use tracing::{info, warn};

use crate::config::Timeouts;
use crate::error::{E2eError, E2eResult};
use crate::normalize::expected_url_fragment;
use crate::page::{ByRole, ByText, Locator, Page, WaitState};

pub struct Common<'a> {
    page: &'a dyn Page,
    timeouts: &'a Timeouts,
}

impl<'a> Common<'a> {
    pub fn new(page: &'a dyn Page, timeouts: &'a Timeouts) -> Self {
        Self { page, timeouts }
    }

    /// First element whose text is exactly `text`
    pub fn by_text(&self, text: &str) -> Locator {
        Locator::text(ByText::new(text)).first()
    }

    pub fn by_role(&self, by: ByRole) -> Locator {
        Locator::role(by).first()
    }

    pub fn by_css(&self, selector: &str) -> Locator {
        Locator::css(selector).first()
    }

    pub async fn fill_by_text(&self, text: &str, value: &str) -> E2eResult<()> {
        self.page.fill(&self.by_text(text), value).await
    }

    pub async fn fill_by_role(&self, by: ByRole, value: &str) -> E2eResult<()> {
        self.page.fill(&self.by_role(by), value).await
    }

    pub async fn click_by_text(&self, text: &str) -> E2eResult<()> {
        self.page.click(&self.by_text(text)).await
    }

    pub async fn click_by_role(&self, by: ByRole) -> E2eResult<()> {
        self.page.click(&self.by_role(by)).await
    }

    /// Click `button[name=...]`
    pub async fn click_by_name(&self, name: &str) -> E2eResult<()> {
        self.page
            .click(&Locator::css(format!("button[name={}]", name)))
            .await
    }

    /// Checked state from `aria-checked`; a missing element reads as unchecked
    pub async fn is_checked(&self, locator: &Locator) -> E2eResult<bool> {
        if self.page.count(locator).await? == 0 {
            return Ok(false);
        }
        let aria = self.page.attribute(locator, "aria-checked").await?;
        Ok(aria.as_deref() == Some("true"))
    }

    /// Wait for an element with `text`, give it a moment, then click it.
    /// Returns whether the click happened; a miss is only logged.
    pub async fn click_when_ready(&self, text: &str) -> bool {
        let target = Locator::css(format!("text={}", text)).first();
        let timeout = self.timeouts.click_ready();

        if let Err(e) = self.page.wait_for(&target, WaitState::Visible, timeout).await {
            warn!(
                "Element with text '{}' not found after {} ms: {}",
                text,
                timeout.as_millis(),
                e
            );
            return false;
        }
        tokio::time::sleep(Duration::from_millis(self.timeouts.click_settle_ms)).await;
        match self.page.click(&target).await {
            Ok(()) => {
                info!("Clicked element with text '{}'", text);
                true
            }
            Err(e) => {
                warn!("Click on '{}' failed: {}", text, e);
                false
            }
        }
    }

    /// The current URL must contain `/{normalized label}/`
    pub async fn assert_url_matches_label(&self, label: &str) -> E2eResult<()> {
        let expected = expected_url_fragment(label);
        let url = self.page.url().await?;
        if url.contains(&expected) {
            Ok(())
        } else {
            Err(E2eError::AssertionFailed(format!(
                "expected URL containing '{}', got '{}'",
                expected, url
            )))
        }
    }
}
