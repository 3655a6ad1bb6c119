//! Export confirmation through observed responses

mod common;

use std::time::Duration;

use common::fake_page::FakePage;
use wakamiti_e2e::config::{ExportConfig, Timeouts};
use wakamiti_e2e::download::{DownloadConfirmer, ResponseMatcher};
use wakamiti_e2e::error::E2eError;
use wakamiti_e2e::helpers::Common;
use wakamiti_e2e::page::NetworkResponse;

const EXPORT_URL: &str = "https://front/proveedores-api/export-as?excelGeneratorType=DOM";

fn export_page(responses: Vec<NetworkResponse>) -> FakePage {
    let page = FakePage::new();
    {
        let mut state = page.state.lock();
        state.ready_texts.insert("Exportar como".to_string());
        state.ready_texts.insert("Excel".to_string());
        state.responses_on_click.insert("Excel".to_string(), responses);
    }
    page
}

#[tokio::test]
async fn test_export_confirmed_by_matching_response() {
    let page = export_page(vec![
        NetworkResponse {
            url: "https://front/proveedores-api/list".to_string(),
            status: 200,
        },
        NetworkResponse {
            url: EXPORT_URL.to_string(),
            status: 200,
        },
    ]);

    let outcome = DownloadConfirmer::new(&page)
        .export_grid(&ExportConfig::default(), &Timeouts::immediate())
        .await
        .unwrap();
    assert_eq!(outcome.response.url, EXPORT_URL);

    let state = page.state.lock();
    assert_eq!(state.clicked_texts, vec!["Exportar como", "Excel"]);
    assert_eq!(state.on_response_calls, 1);
    assert_eq!(state.off_response_calls.len(), 1);
    assert!(state.subscribers.is_empty());

    // Listener registered before the triggering click
    let listen = state.events.iter().position(|e| e == "on_response").unwrap();
    let click = state.events.iter().position(|e| e == "click:Excel").unwrap();
    assert!(listen < click);
}

#[tokio::test]
async fn test_export_times_out_and_deregisters_once() {
    let page = export_page(vec![NetworkResponse {
        url: EXPORT_URL.to_string(),
        status: 500,
    }]);

    let err = DownloadConfirmer::new(&page)
        .export_grid(&ExportConfig::default(), &Timeouts::immediate())
        .await
        .unwrap_err();
    match err {
        E2eError::DownloadTimeout { pattern, timeout_ms } => {
            assert_eq!(pattern, ExportConfig::default().url_fragment);
            assert_eq!(timeout_ms, 200);
        }
        other => panic!("unexpected error {:?}", other),
    }

    let state = page.state.lock();
    assert_eq!(state.off_response_calls.len(), 1);
    assert!(state.subscribers.is_empty());
}

#[tokio::test]
async fn test_failing_trigger_still_deregisters() {
    let page = FakePage::new();
    let matcher = ResponseMatcher::new("/export", 200);

    let err = DownloadConfirmer::new(&page)
        .confirm_export(
            || async { Err(E2eError::ElementNotFound("Excel".to_string())) },
            &matcher,
            Duration::from_millis(100),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, E2eError::ElementNotFound(_)));
    assert_eq!(page.state.lock().off_response_calls.len(), 1);
}

#[tokio::test]
async fn test_download_window_opens_after_slow_trigger() {
    let page = export_page(vec![NetworkResponse {
        url: EXPORT_URL.to_string(),
        status: 200,
    }]);
    let timeouts = Timeouts::immediate();
    let common = Common::new(&page, &timeouts);
    let matcher = ResponseMatcher::from(&ExportConfig::default());

    // The trigger outlasts the timeout; only the wait after it is bounded
    let outcome = DownloadConfirmer::new(&page)
        .confirm_export(
            || async {
                tokio::time::sleep(Duration::from_millis(150)).await;
                assert!(common.click_when_ready("Excel").await);
                Ok(())
            },
            &matcher,
            Duration::from_millis(50),
        )
        .await
        .unwrap();
    assert_eq!(outcome.response.url, EXPORT_URL);
    assert!(outcome.elapsed >= Duration::from_millis(150));
}

#[tokio::test]
async fn test_missing_menu_is_only_logged() {
    // Neither text is present: clicks are skipped and the wait times out
    let page = FakePage::new();
    let err = DownloadConfirmer::new(&page)
        .export_grid(&ExportConfig::default(), &Timeouts::immediate())
        .await
        .unwrap_err();
    assert!(matches!(err, E2eError::DownloadTimeout { .. }));
    assert!(page.state.lock().clicked_texts.is_empty());
}
