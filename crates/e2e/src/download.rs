//! Export confirmation through network-response observation

use std::future::Future;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{ExportConfig, Timeouts};
use crate::error::{E2eError, E2eResult};
use crate::helpers::Common;
use crate::page::{NetworkResponse, Page, SubscriptionId};

/// Which response counts as a finished export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMatcher {
    pub url_fragment: String,
    pub status: u16,
}

impl ResponseMatcher {
    pub fn new(url_fragment: impl Into<String>, status: u16) -> Self {
        Self {
            url_fragment: url_fragment.into(),
            status,
        }
    }

    pub fn matches(&self, response: &NetworkResponse) -> bool {
        response.status == self.status && response.url.contains(&self.url_fragment)
    }
}

impl From<&ExportConfig> for ResponseMatcher {
    fn from(config: &ExportConfig) -> Self {
        Self::new(config.url_fragment.clone(), config.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub response: NetworkResponse,
    /// Trigger included
    pub elapsed: Duration,
}

/// Deregisters its subscription when dropped, whatever path got there
struct SubscriptionGuard<'a> {
    page: &'a dyn Page,
    id: Option<SubscriptionId>,
}

impl Drop for SubscriptionGuard<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            debug!("Removing response listener {}", id);
            self.page.off_response(id);
        }
    }
}

pub struct DownloadConfirmer<'a> {
    page: &'a dyn Page,
}

impl<'a> DownloadConfirmer<'a> {
    pub fn new(page: &'a dyn Page) -> Self {
        Self { page }
    }

    /// Run `trigger` and resolve on the first response accepted by `matcher`.
    /// Fails with [`E2eError::DownloadTimeout`] once `timeout` elapses.
    ///
    /// The `timeout` window opens only after `trigger` returns, so the worst
    /// case is the trigger's own waits plus `timeout`. For [`Self::export_grid`]
    /// that is `click_ready_ms + click_settle_ms + download_ms`. The reported
    /// `elapsed` counts from before the trigger.
    pub async fn confirm_export<F, Fut>(
        &self,
        trigger: F,
        matcher: &ResponseMatcher,
        timeout: Duration,
    ) -> E2eResult<DownloadOutcome>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = E2eResult<()>>,
    {
        let subscription = self.page.on_response();
        let _guard = SubscriptionGuard {
            page: self.page,
            id: Some(subscription.id),
        };
        let mut responses = subscription.responses;

        let start = Instant::now();
        trigger().await?;

        let waited = tokio::time::timeout(timeout, async {
            while let Some(response) = responses.recv().await {
                if matcher.matches(&response) {
                    return Ok(response);
                }
                debug!("Ignoring response {} {}", response.status, response.url);
            }
            Err(E2eError::ResponseStreamClosed)
        })
        .await;

        match waited {
            Ok(Ok(response)) => {
                info!("Download completed ({} {})", response.status, response.url);
                Ok(DownloadOutcome {
                    response,
                    elapsed: start.elapsed(),
                })
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                warn!("Download not detected within {} ms", timeout.as_millis());
                Err(E2eError::DownloadTimeout {
                    pattern: matcher.url_fragment.clone(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Open the export menu and confirm the spreadsheet download
    pub async fn export_grid(&self, export: &ExportConfig, timeouts: &Timeouts) -> E2eResult<DownloadOutcome> {
        let common = Common::new(self.page, timeouts);
        common.click_when_ready(&export.menu_text).await;

        let matcher = ResponseMatcher::from(export);
        self.confirm_export(
            || async {
                common.click_when_ready(&export.format_text).await;
                Ok(())
            },
            &matcher,
            timeouts.download(),
        )
        .await
    }
}
