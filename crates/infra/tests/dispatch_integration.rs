//! Dispatch layer integration tests against a mock search endpoint.

use std::net::TcpListener;
use std::time::Duration;

use chaff_core::random::SequenceSource;
use chaff_domain::SearchEngine;
use chaff_infra::{DispatcherConfig, QueryDispatcher};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn dispatcher_for(server_uri: &str) -> QueryDispatcher {
    let config = DispatcherConfig {
        timeout: Duration::from_secs(5),
        endpoint_override: Some(server_uri.to_string()),
        think_time_ms: (0, 1),
        ..DispatcherConfig::default()
    };
    // Referrer draw of 0.0 keeps every request on the engine-homepage branch.
    QueryDispatcher::new(config, Box::new(SequenceSource::constant(0.0)))
        .expect("dispatcher built")
}

#[tokio::test]
async fn successful_dispatch_reports_status_and_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server.uri());
    let outcome = dispatcher.execute_query(SearchEngine::Google, "best pizza").await;

    assert!(outcome.is_success());
    assert!(outcome.url().expect("url").contains("q=best%20pizza"));
    assert_eq!(dispatcher.stats().failure_count, 0);
    assert_eq!(dispatcher.backoff_multiplier(), 1.0);
}

#[tokio::test]
async fn query_requests_carry_the_navigation_header_set() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server.uri());
    dispatcher.execute_query(SearchEngine::Google, "coffee near me").await;

    let requests = server.received_requests().await.expect("requests");
    assert_eq!(requests.len(), 1);
    let headers = &requests[0].headers;

    assert_eq!(
        headers.get("referer").and_then(|v| v.to_str().ok()),
        Some("https://www.google.com")
    );
    assert_eq!(
        headers.get("sec-fetch-site").and_then(|v| v.to_str().ok()),
        Some("same-origin")
    );
    assert_eq!(headers.get("sec-fetch-mode").and_then(|v| v.to_str().ok()), Some("navigate"));
    assert_eq!(headers.get("upgrade-insecure-requests").and_then(|v| v.to_str().ok()), Some("1"));
    assert_eq!(headers.get("dnt").and_then(|v| v.to_str().ok()), Some("1"));
}

#[tokio::test]
async fn rate_limits_walk_the_backoff_ladder() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server.uri());

    for expected in [2.0, 4.0, 8.0] {
        let outcome = dispatcher.execute_query(SearchEngine::Google, "query").await;
        assert!(!outcome.is_success());
        assert_eq!(dispatcher.backoff_multiplier(), expected);
    }

    // Pause only trips past the failure threshold.
    assert!(!dispatcher.should_pause());
    for _ in 0..8 {
        dispatcher.execute_query(SearchEngine::Google, "query").await;
    }
    assert!(dispatcher.should_pause());
}

#[tokio::test]
async fn server_errors_escalate_backoff_only_past_threshold() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server.uri());

    for _ in 0..5 {
        dispatcher.execute_query(SearchEngine::Google, "query").await;
        assert_eq!(dispatcher.backoff_multiplier(), 1.0);
    }

    dispatcher.execute_query(SearchEngine::Google, "query").await;
    assert_eq!(dispatcher.backoff_multiplier(), 1.5);
    assert_eq!(dispatcher.stats().failure_count, 6);
}

#[tokio::test]
async fn success_decays_backoff_toward_floor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server.uri());

    dispatcher.execute_query(SearchEngine::Google, "query").await;
    assert_eq!(dispatcher.backoff_multiplier(), 2.0);

    dispatcher.execute_query(SearchEngine::Google, "query").await;
    assert_eq!(dispatcher.backoff_multiplier(), 1.8);
}

#[tokio::test]
async fn network_failure_is_folded_into_the_outcome() {
    // Bind a port, then release it so the connection is refused.
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let dispatcher = dispatcher_for(&format!("http://{addr}"));
    let outcome = dispatcher.execute_query(SearchEngine::Google, "query").await;

    assert!(!outcome.is_success());
    assert_eq!(dispatcher.stats().failure_count, 1);
}

#[tokio::test]
async fn result_click_sends_search_url_as_cross_site_referrer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server.uri());
    let result_url = format!("{}/article", server.uri());
    let search_url = "https://www.google.com/search?q=test";

    let outcome = dispatcher
        .simulate_result_click(&result_url, search_url, Duration::from_millis(5))
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.dwell, Duration::from_millis(5));

    let requests = server.received_requests().await.expect("requests");
    let headers = &requests[0].headers;
    assert_eq!(headers.get("referer").and_then(|v| v.to_str().ok()), Some(search_url));
    assert_eq!(headers.get("sec-fetch-site").and_then(|v| v.to_str().ok()), Some("cross-site"));
}

#[tokio::test]
async fn result_click_failure_is_swallowed() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let server = MockServer::start().await;
    let dispatcher = dispatcher_for(&server.uri());

    let outcome = dispatcher
        .simulate_result_click(
            &format!("http://{addr}/article"),
            "https://www.google.com/search?q=test",
            Duration::from_millis(5),
        )
        .await;

    assert!(!outcome.success);
    assert!(outcome.error.is_some());
    // Click failures do not count against dispatch failure tracking.
    assert_eq!(dispatcher.stats().failure_count, 0);
}
