use chrono::Local;
use std::time::{Duration, Instant};
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use site_watcher::notify::webhook::{build_payload, post_payload};
use site_watcher::notify::{ChangeEvent, Notifier, WebhookNotifier};
use site_watcher::parsers::canonical_text;
use site_watcher::utils::http::{FetchError, Fetcher, HttpFetcher, USER_AGENT};

fn url_for(server: &MockServer, route: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), route)).unwrap()
}

#[tokio::test]
async fn fetches_html_with_watcher_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history"))
        .and(header("user-agent", USER_AGENT))
        .and(header("accept", "text/html,application/xhtml+xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<h1>All Systems Operational</h1>", "text/html; charset=utf-8"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
    let body = fetcher.fetch(&url_for(&server, "/history")).await.unwrap();
    assert_eq!(canonical_text(&body), "All Systems Operational");
}

#[tokio::test]
async fn decodes_declared_charset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latin1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"<p>Caf\xe9 ouvert</p>".to_vec(), "text/html; charset=iso-8859-1"),
        )
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
    let body = fetcher.fetch(&url_for(&server, "/latin1")).await.unwrap();
    assert_eq!(canonical_text(&body), "Café ouvert");
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
    let err = fetcher.fetch(&url_for(&server, "/down")).await.unwrap_err();
    match err {
        FetchError::Status { status, .. } => assert_eq!(status.as_u16(), 503),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn slow_responses_time_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(Duration::from_millis(200)).unwrap();
    let err = fetcher.fetch(&url_for(&server, "/slow")).await.unwrap_err();
    assert!(matches!(err, FetchError::Http(_)));
}

async fn wait_for_requests(server: &MockServer, count: usize) -> Vec<wiremock::Request> {
    for _ in 0..100 {
        let requests = server.received_requests().await.unwrap();
        if requests.len() >= count {
            return requests;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("expected {count} request(s) at the mock server");
}

fn change_event(report: &str) -> ChangeEvent {
    ChangeEvent {
        url: "https://status.example.com/history".into(),
        detected_at: Local::now(),
        report: report.into(),
    }
}

#[tokio::test]
async fn webhook_posts_report_as_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(url_for(&server, "/hook")).unwrap();
    let event = change_event("Removed:\n  - Operational\nAdded:\n  + Major Outage\n");
    notifier.notify(&event).await.unwrap();

    let requests = wait_for_requests(&server, 1).await;
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let content = body["content"].as_str().unwrap();
    assert!(content.starts_with("CHANGE DETECTED: "));
    assert!(content.contains("  + Major Outage"));
}

#[tokio::test]
async fn webhook_returns_before_a_slow_endpoint_answers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_secs(8)))
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(url_for(&server, "/hook")).unwrap();
    let started = Instant::now();
    notifier.notify(&change_event("Added:\n  + Outage\n")).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn webhook_endpoint_errors_are_surfaced_by_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad payload"))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let payload = build_payload(&change_event(""));
    let err = post_payload(&client, &url_for(&server, "/hook"), &payload)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("400"));
    assert!(err.to_string().contains("bad payload"));
}

#[tokio::test]
async fn webhook_endpoint_errors_do_not_fail_notify() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(url_for(&server, "/hook")).unwrap();
    notifier.notify(&change_event("")).await.unwrap();
    wait_for_requests(&server, 1).await;
}
