//! Shared fixtures for the integration tests

#![allow(dead_code)]

pub mod fake_page;

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use wakamiti_e2e::error::E2eResult;
use wakamiti_e2e::page::{Page, PageFactory};

use fake_page::FakePage;

/// Route `tracing` output through the test harness; safe to call repeatedly
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("wakamiti_e2e=debug"))
        .with_test_writer()
        .try_init();
}

/// Hands out fake pages built by `build` and keeps them for inspection
pub struct FakeFactory {
    build: Box<dyn Fn() -> FakePage + Send + Sync>,
    pub pages: Mutex<Vec<Arc<FakePage>>>,
}

impl FakeFactory {
    pub fn new(build: impl Fn() -> FakePage + Send + Sync + 'static) -> Self {
        Self {
            build: Box::new(build),
            pages: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PageFactory for FakeFactory {
    async fn new_page(&self) -> E2eResult<Arc<dyn Page>> {
        let page = Arc::new((self.build)());
        self.pages.lock().push(page.clone());
        Ok(page as Arc<dyn Page>)
    }
}
