//! User-triggered recheck flow.

use std::time::Duration;

use adgate_core::SessionError;
use adgate_engine::{GateError, PageScript, ResolvedConfig, STILL_BLOCKED_FEEDBACK};
use adgate_types::UiState;
use tokio::time::Instant;

use crate::common::{desktop_chrome, harness, harness_with_config, script, strings};

fn blocked_on(path: &str) -> PageScript {
    PageScript {
        hidden_classes: strings(&["ad-banner"]),
        blocked_urls: strings(&["/ads/"]),
        ..script(path, desktop_chrome())
    }
}

#[tokio::test(start_paused = true)]
async fn whitelisted_recheck_returns_to_clean_match_page_after_delay() {
    let mut h = harness(blocked_on("/matchadblock/42"));
    let load = h.gate.on_page_load().await.unwrap();
    assert!(load.verdict.blocked);
    assert!(h.page.navigations().is_empty());

    h.page.whitelist();
    let start = Instant::now();
    let outcome = h.gate.recheck().await.unwrap().unwrap();

    assert!(!outcome.verdict.blocked);
    assert_eq!(outcome.navigation.as_deref(), Some("/match/42"));
    assert_eq!(outcome.feedback, None);
    assert_eq!(start.elapsed(), Duration::from_millis(500));
    assert_eq!(h.page.navigations(), vec!["/match/42".to_string()]);
    assert_eq!(
        h.page.ui_states(),
        vec![UiState::AdblockOn, UiState::AdblockOff]
    );
    assert_eq!(h.gate.session().ui_writes(), 2);
}

#[tokio::test(start_paused = true)]
async fn still_blocked_recheck_shows_feedback_and_stays() {
    let mut h = harness(blocked_on("/homepageadblock"));
    h.gate.on_page_load().await.unwrap();

    let outcome = h.gate.recheck().await.unwrap().unwrap();

    assert!(outcome.verdict.blocked);
    assert_eq!(outcome.navigation, None);
    assert_eq!(outcome.feedback.as_deref(), Some(STILL_BLOCKED_FEEDBACK));
    assert_eq!(h.page.feedback(), vec![STILL_BLOCKED_FEEDBACK.to_string()]);
    assert!(h.page.navigations().is_empty());
    assert_eq!(h.page.ui_states(), vec![UiState::AdblockOn, UiState::AdblockOn]);
}

#[tokio::test(start_paused = true)]
async fn clear_recheck_on_clean_page_stays() {
    let mut h = harness(script("/tennis", desktop_chrome()));
    h.gate.on_page_load().await.unwrap();

    let outcome = h.gate.recheck().await.unwrap().unwrap();
    assert!(!outcome.verdict.blocked);
    assert_eq!(outcome.navigation, None);
    assert!(h.page.navigations().is_empty());
}

#[tokio::test(start_paused = true)]
async fn recheck_uses_the_shorter_deadline() {
    let mut h = harness(PageScript {
        latency_ms: 10_000,
        hidden_classes: strings(&["ad-banner"]),
        ..script("/footballadblock", desktop_chrome())
    });

    let start = Instant::now();
    h.gate.on_page_load().await.unwrap();
    assert_eq!(start.elapsed(), Duration::from_millis(1500));

    let start = Instant::now();
    let outcome = h.gate.recheck().await.unwrap().unwrap();
    assert_eq!(start.elapsed(), Duration::from_millis(800));
    assert_eq!(outcome.first_party.timeout_ms, 800);
}

#[tokio::test(start_paused = true)]
async fn recheck_honours_configured_delay() {
    let config = ResolvedConfig {
        recheck_navigation_delay: Duration::from_millis(250),
        ..ResolvedConfig::default()
    };
    let mut h = harness_with_config(blocked_on("/ufcadblock"), config);
    h.gate.on_page_load().await.unwrap();
    h.page.whitelist();

    let start = Instant::now();
    h.gate.recheck().await.unwrap();

    assert_eq!(start.elapsed(), Duration::from_millis(250));
    assert_eq!(h.page.navigations(), vec!["/ufc".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn recheck_after_navigation_is_a_no_op() {
    let mut h = harness(blocked_on("/baseball"));
    h.gate.on_page_load().await.unwrap();
    assert_eq!(h.page.navigations(), vec!["/baseballadblock".to_string()]);

    h.page.whitelist();
    let outcome = h.gate.recheck().await.unwrap();

    assert!(outcome.is_none());
    assert_eq!(h.page.navigations().len(), 1);
    assert_eq!(h.page.ui_states().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn recheck_before_load_is_an_error() {
    let mut h = harness(script("/", desktop_chrome()));

    let err = h.gate.recheck().await.unwrap_err();

    assert!(matches!(err, GateError::Session(SessionError::NotInitialized)));
}

#[tokio::test(start_paused = true)]
async fn recheck_does_not_report_telemetry() {
    let mut h = harness(blocked_on("/homepageadblock"));
    h.gate.on_page_load().await.unwrap();
    h.gate.recheck().await.unwrap();
    h.page.whitelist();
    h.gate.recheck().await.unwrap();

    assert_eq!(h.telemetry.reports().len(), 1);
    assert_eq!(h.page.navigations(), vec!["/".to_string()]);
    assert_eq!(h.page.live_elements(), 0);
}
