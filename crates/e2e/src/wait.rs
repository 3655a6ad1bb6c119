//! Best-effort waits
//!
//! Neither wait is a precondition: on timeout they log and hand control back,
//! and callers re-verify whatever state they depend on.

use std::time::Duration;

use tracing::{info, warn};

use crate::page::{LoadState, Locator, Page, WaitState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Settled,
    GaveUp,
}

impl WaitOutcome {
    pub fn settled(&self) -> bool {
        matches!(self, WaitOutcome::Settled)
    }
}

/// Wait until the page reports network idle, at most `timeout`
pub async fn await_network_idle(page: &dyn Page, timeout: Duration) -> WaitOutcome {
    match page.wait_for_load_state(LoadState::NetworkIdle, timeout).await {
        Ok(()) => {
            info!("No active network requests");
            WaitOutcome::Settled
        }
        Err(e) => {
            warn!(
                "Network still busy after {} ms, continuing: {}",
                timeout.as_millis(),
                e
            );
            WaitOutcome::GaveUp
        }
    }
}

/// Wait until the loading indicator matched by `spinner` is hidden
pub async fn await_spinner_hidden(page: &dyn Page, spinner: &str, timeout: Duration) -> WaitOutcome {
    match page
        .wait_for(&Locator::css(spinner), WaitState::Hidden, timeout)
        .await
    {
        Ok(()) => {
            info!("Spinner is hidden");
            WaitOutcome::Settled
        }
        Err(e) => {
            warn!("Spinner still visible, continuing: {}", e);
            WaitOutcome::GaveUp
        }
    }
}
