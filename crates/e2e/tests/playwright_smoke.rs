//! Real-browser smoke test
//!
//! Needs node with Playwright installed and a reachable front-end:
//! `WAKAMITI_BASE_URL=http://... cargo test -p wakamiti-e2e --test playwright_smoke -- --ignored`

use std::time::Duration;

use wakamiti_e2e::config::SuiteConfig;
use wakamiti_e2e::frontend::wait_until_reachable;
use wakamiti_e2e::page::{Locator, Page};
use wakamiti_e2e::playwright::{PlaywrightConfig, PlaywrightPage};

#[tokio::test]
#[ignore = "requires Playwright and a running front-end"]
async fn test_home_page_title() {
    let mut config = SuiteConfig::default();
    config
        .apply_env(|key| std::env::var(key).ok())
        .unwrap();
    wait_until_reachable(&config.base_url, Duration::from_secs(30))
        .await
        .unwrap();

    let page = PlaywrightPage::launch(&PlaywrightConfig::default()).await.unwrap();
    page.goto(&config.base_url).await.unwrap();
    assert!(page.title().await.unwrap().contains("Wakamiti"));
    assert!(page.count(&Locator::css("body")).await.unwrap() >= 1);
    page.close().await.unwrap();
}
