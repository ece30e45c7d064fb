//! Tracking endpoint delivery.

use std::sync::Arc;
use std::time::Duration;

use adgate_config::GateConfig;
use adgate_engine::{
    AdGate, HttpTelemetry, PageScript, ResolvedConfig, ScriptedPage, TelemetryError,
    TelemetrySink, sink_for, tracking_report,
};
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use crate::common::{desktop_chrome, script, strings};

fn endpoint(server: &MockServer) -> Url {
    Url::parse(&server.uri())
        .unwrap()
        .join("/api/track-adblock")
        .unwrap()
}

/// Poll until the server has seen `count` requests or a second has passed.
async fn wait_for_requests(server: &MockServer, count: usize) -> Vec<Request> {
    for _ in 0..100 {
        let received = server.received_requests().await.unwrap_or_default();
        if received.len() >= count {
            return received;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    server.received_requests().await.unwrap_or_default()
}

#[tokio::test]
async fn deliver_posts_json_report() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/track-adblock"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(serde_json::json!({
            "adblock": true,
            "page": "/football",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let sink = HttpTelemetry::new(endpoint(&server)).unwrap();
    sink.deliver(&tracking_report(true, "/football"))
        .await
        .unwrap();
}

#[tokio::test]
async fn server_error_is_reported_to_the_caller_of_deliver() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/track-adblock"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let sink = HttpTelemetry::new(endpoint(&server)).unwrap();
    let err = sink
        .deliver(&tracking_report(false, "/"))
        .await
        .unwrap_err();

    assert!(matches!(err, TelemetryError::Status(status) if status.as_u16() == 503));
}

#[tokio::test]
async fn report_is_fire_and_forget() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/track-adblock"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let sink = HttpTelemetry::new(endpoint(&server)).unwrap();
    // A failing endpoint never surfaces here.
    sink.report(tracking_report(true, "/tennisadblock"));

    let received = wait_for_requests(&server, 1).await;
    assert_eq!(received.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["page"], "/tennisadblock");
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn page_load_sends_one_report_to_configured_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/track-adblock"))
        .and(body_partial_json(serde_json::json!({
            "adblock": true,
            "page": "/football",
        })))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let config = GateConfig::parse(&format!(
        "[telemetry]\nbase_url = \"{}\"\n",
        server.uri()
    ))
    .unwrap();
    let resolved = ResolvedConfig::from_config(&config).unwrap();
    let telemetry = sink_for(&resolved).unwrap();
    let page = Arc::new(ScriptedPage::new(PageScript {
        hidden_classes: strings(&["ad-banner"]),
        ..script("/football", desktop_chrome())
    }));
    let mut gate = AdGate::new(page.clone(), resolved, telemetry);

    let outcome = gate.on_page_load().await.unwrap();
    assert!(outcome.verdict.blocked);
    gate.recheck().await.unwrap();

    let received = wait_for_requests(&server, 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(received.len(), 1);
    assert_eq!(server.received_requests().await.unwrap_or_default().len(), 1);
}
