//! Front-end reachability probe run before a suite

use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

/// Poll `base_url` until it answers with a non-5xx status
pub async fn wait_until_reachable(base_url: &str, timeout_duration: Duration) -> E2eResult<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;

    let start = std::time::Instant::now();
    let mut attempts = 0;

    while start.elapsed() < timeout_duration {
        attempts += 1;

        match client.get(base_url).send().await {
            Ok(resp) if !resp.status().is_server_error() => {
                info!("Front-end reachable at {} ({})", base_url, resp.status());
                return Ok(());
            }
            Ok(resp) => {
                warn!("Front-end returned {}", resp.status());
            }
            Err(e) => {
                if attempts == 1 {
                    info!("Waiting for front-end at {}...", base_url);
                }
                // Connection refused is expected while the front-end starts
                if !e.is_connect() {
                    warn!("Reachability check error: {}", e);
                }
            }
        }

        sleep(Duration::from_millis(250)).await;
    }

    Err(E2eError::FrontendUnreachable {
        url: base_url.to_string(),
        attempts,
    })
}
