//! Webhook delivery tests against a local mock endpoint.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use podsentry_notify::{AlertDispatcher, DeliveryError, PodAlert, SlackNotifier};
use serde_json::Value;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn crashloop_alert() -> PodAlert {
    PodAlert {
        pod_name: "p1".to_string(),
        namespace: "ns".to_string(),
        container_name: "app".to_string(),
        image: "nginx:1.27".to_string(),
        reason: "CrashLoopBackOff".to_string(),
        message: "back-off 10s restarting failed container".to_string(),
        restart_count: 3,
        timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
    }
}

#[tokio::test]
async fn test_dispatch_posts_json_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = SlackNotifier::new(&format!("{}/hook", server.uri())).unwrap();
    let alert = crashloop_alert();
    notifier.dispatch(&alert).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let expected = alert.format_message();
    assert_eq!(body["text"], expected.as_str());
    assert_eq!(body["blocks"][0]["type"], "section");
    assert_eq!(body["blocks"][0]["text"]["type"], "mrkdwn");
    assert_eq!(body["blocks"][0]["text"]["text"], expected.as_str());
    assert_eq!(body["blocks"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_any_2xx_is_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let notifier = SlackNotifier::new(&server.uri()).unwrap();
    assert!(notifier.dispatch(&crashloop_alert()).await.is_ok());
}

#[tokio::test]
async fn test_server_error_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal_error"))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = SlackNotifier::new(&server.uri()).unwrap();
    let err = notifier.dispatch(&crashloop_alert()).await.unwrap_err();

    match &err {
        DeliveryError::Status { status, body } => {
            assert_eq!(*status, 500);
            assert_eq!(body, "internal_error");
        }
        other => panic!("expected status error, got {other:?}"),
    }
    assert_eq!(err.status(), Some(500));
    assert!(!err.is_timeout());
}

#[tokio::test]
async fn test_slow_endpoint_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let notifier =
        SlackNotifier::with_timeout(&server.uri(), Duration::from_millis(100)).unwrap();
    let err = notifier.dispatch(&crashloop_alert()).await.unwrap_err();

    assert!(err.is_timeout(), "expected timeout, got {err:?}");
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_error() {
    // Nothing listens on port 1.
    let uri = "http://127.0.0.1:1/hook";

    let notifier = SlackNotifier::new(uri).unwrap();
    let err = notifier.dispatch(&crashloop_alert()).await.unwrap_err();
    assert!(matches!(err, DeliveryError::Transport(_)));
}
