//! Tests for the DevTools source.
//!
//! Covers turning `/json/list` targets into tab records, and the HTTP round
//! trips against a local stub endpoint.

use pretty_assertions::assert_eq;
use tabscope::config::SourceConfig;
use tabscope::data::{SnapshotOrigin, TabId, TabRecord};
use tabscope::sources::devtools::{DevToolsTarget, IdRegistry};
use tabscope::sources::{fetch_snapshot, DevToolsSource, SourceError, TabSource};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

// ============================================================================
// Test Helpers
// ============================================================================

fn target(id: &str, kind: &str, url: &str) -> DevToolsTarget {
    DevToolsTarget {
        id: id.to_string(),
        target_type: kind.to_string(),
        title: format!("title of {}", id),
        url: Some(url.to_string()),
    }
}

fn list(registry: &mut IdRegistry, targets: &[DevToolsTarget]) -> Vec<TabRecord> {
    registry.records_from_targets(targets).unwrap()
}

fn source_at(endpoint: String) -> DevToolsSource {
    let config = SourceConfig {
        endpoint,
        request_timeout_secs: 2,
        connect_timeout_secs: 1,
        ..SourceConfig::default()
    };
    DevToolsSource::new(&config).unwrap()
}

/// Serve canned responses on a loopback port, one connection per request.
///
/// `route` maps a request path to a status code and JSON body.
async fn stub_endpoint(route: fn(&str) -> (u16, String)) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut buf: Vec<u8> = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&buf);
                let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();

                let (status, body) = route(&path);
                let response = format!(
                    "HTTP/1.1 {} STUB\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    format!("http://{}", addr)
}

const TWO_PAGES: &str = r#"[
    {"id": "A", "type": "page", "title": "A", "url": "https://a.com"},
    {"id": "SW", "type": "service_worker", "title": "sw", "url": "https://a.com/sw.js"},
    {"id": "B", "type": "page", "title": "B", "url": "https://b.com"}
]"#;

fn browser_route(path: &str) -> (u16, String) {
    match path {
        "/json/list" => (200, TWO_PAGES.to_string()),
        "/json/close/A" => (200, "\"Target is closing\"".to_string()),
        "/json/close/B" => (500, "\"Could not close\"".to_string()),
        "/json/activate/A" => (200, "\"Target activated\"".to_string()),
        _ => (404, "\"Unknown\"".to_string()),
    }
}

// ============================================================================
// Target Mapping
// ============================================================================

#[test]
fn test_only_pages_are_tabs() {
    let mut registry = IdRegistry::new();
    let records = list(&mut registry, &[
        target("A1", "page", "https://a.com"),
        target("W1", "service_worker", "https://a.com/sw.js"),
        target("B1", "page", "https://b.com"),
        target("X1", "iframe", "https://ads.example"),
    ]);

    let urls: Vec<&str> = records.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, vec!["https://a.com", "https://b.com"]);
    assert_eq!(records[0].title, "title of A1");
}

#[test]
fn test_first_page_is_active() {
    let mut registry = IdRegistry::new();
    let records = list(&mut registry, &[
        target("W1", "worker", "https://w.com"),
        target("A1", "page", "https://a.com"),
        target("B1", "page", "https://b.com"),
    ]);
    let active: Vec<bool> = records.iter().map(|r| r.active).collect();
    assert_eq!(active, vec![true, false]);
}

#[test]
fn test_ids_stable_across_listings() {
    let mut registry = IdRegistry::new();
    let first = list(&mut registry, &[
        target("A1", "page", "https://a.com"),
        target("B1", "page", "https://b.com"),
    ]);
    // Focus moved to B1, which now lists first
    let second = list(&mut registry, &[
        target("B1", "page", "https://b.com"),
        target("A1", "page", "https://a.com"),
    ]);

    assert_eq!(first[0].id, second[1].id);
    assert_eq!(first[1].id, second[0].id);
    assert_eq!(registry.target_for(first[0].id), Some("A1"));
}

#[test]
fn test_vanished_targets_forgotten_and_ids_not_reused() {
    let mut registry = IdRegistry::new();
    let first = list(&mut registry, &[
        target("A1", "page", "https://a.com"),
        target("B1", "page", "https://b.com"),
    ]);
    let gone = first[0].id;

    let second = list(&mut registry, &[
        target("B1", "page", "https://b.com"),
        target("C1", "page", "https://c.com"),
    ]);

    assert_eq!(registry.target_for(gone), None);
    assert!(second.iter().all(|r| r.id != gone));
    assert_eq!(second[1].id, TabId(3));
}

#[test]
fn test_duplicate_urls_get_distinct_ids() {
    let mut registry = IdRegistry::new();
    let records = list(&mut registry, &[
        target("A1", "page", "https://a.com"),
        target("A2", "page", "https://a.com"),
    ]);
    assert_ne!(records[0].id, records[1].id);
}

#[test]
fn test_target_json_shape() {
    let json = r#"[{
        "description": "",
        "devtoolsFrontendUrl": "/devtools/inspector.html?ws=localhost:9222/devtools/page/ABC",
        "id": "ABC",
        "title": "Example",
        "type": "page",
        "url": "https://example.com/",
        "webSocketDebuggerUrl": "ws://localhost:9222/devtools/page/ABC"
    }]"#;
    let targets: Vec<DevToolsTarget> = serde_json::from_str(json).unwrap();
    assert_eq!(targets[0].id, "ABC");
    assert_eq!(targets[0].target_type, "page");
    assert_eq!(targets[0].url.as_deref(), Some("https://example.com/"));
}

#[test]
fn test_page_without_url_rejects_listing() {
    let json = r#"[
        {"id": "A", "type": "page", "title": "A"},
        {"id": "B", "type": "page", "title": "B", "url": "https://b.com"}
    ]"#;
    let targets: Vec<DevToolsTarget> = serde_json::from_str(json).unwrap();
    let mut registry = IdRegistry::new();

    let err = registry.records_from_targets(&targets).unwrap_err();
    assert!(matches!(err, SourceError::Malformed { index: 0, .. }));
    // Nothing was registered for the rejected listing
    assert_eq!(registry.target_for(TabId(1)), None);
}

#[test]
fn test_non_page_without_url_is_ignored() {
    let json = r#"[
        {"id": "W", "type": "worker", "title": "w"},
        {"id": "B", "type": "page", "title": "B", "url": "https://b.com"}
    ]"#;
    let targets: Vec<DevToolsTarget> = serde_json::from_str(json).unwrap();
    let records = list(&mut IdRegistry::new(), &targets);
    assert_eq!(records.len(), 1);
}

#[test]
fn test_repeated_target_rejects_listing() {
    let mut registry = IdRegistry::new();
    let err = registry
        .records_from_targets(&[
            target("A", "page", "https://a.com"),
            target("B", "page", "https://b.com"),
            target("B", "page", "https://c.com"),
        ])
        .unwrap_err();
    assert!(matches!(err, SourceError::Malformed { index: 2, .. }));
}

// ============================================================================
// HTTP Round Trips
// ============================================================================

#[tokio::test]
async fn test_closed_port_falls_back_to_sample() {
    // Bind then drop to get a loopback port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source = source_at(format!("http://{}", addr));
    assert!(source.list_tabs().await.unwrap_err().is_unavailable());

    let snapshot = fetch_snapshot(&source).await.unwrap();
    assert_eq!(snapshot.origin, SnapshotOrigin::Sample);
}

#[tokio::test]
async fn test_list_over_http() {
    let source = source_at(stub_endpoint(browser_route).await);
    let tabs = source.list_tabs().await.unwrap();

    let urls: Vec<&str> = tabs.iter().map(|t| t.url.as_str()).collect();
    assert_eq!(urls, vec!["https://a.com", "https://b.com"]);
    assert_eq!(tabs[0].id, TabId(1));
    assert!(tabs[0].active);
}

#[tokio::test]
async fn test_rejected_close_is_partial_failure() {
    let source = source_at(stub_endpoint(browser_route).await);
    let tabs = source.list_tabs().await.unwrap();

    let err = source.close_tabs(&[tabs[0].id, tabs[1].id]).await.unwrap_err();
    match err {
        SourceError::PartialFailure { failed } => assert_eq!(failed, vec![tabs[1].id]),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_activate_known_and_unknown_tabs() {
    let source = source_at(stub_endpoint(browser_route).await);
    let tabs = source.list_tabs().await.unwrap();

    source.activate_tab(tabs[0].id).await.unwrap();
    let err = source.activate_tab(TabId(99)).await.unwrap_err();
    assert!(matches!(err, SourceError::UnknownTab(TabId(99))));
}

#[tokio::test]
async fn test_server_error_is_not_a_fallback() {
    let source = source_at(stub_endpoint(|_| (500, "\"boom\"".to_string())).await);

    let err = fetch_snapshot(&source).await.unwrap_err();
    assert!(matches!(err, SourceError::Transport(_)));
}

#[tokio::test]
async fn test_malformed_listing_over_http() {
    fn route(_: &str) -> (u16, String) {
        let body = r#"[{"id": "A", "type": "page", "title": "no url"}]"#;
        (200, body.to_string())
    }
    let source = source_at(stub_endpoint(route).await);

    let err = fetch_snapshot(&source).await.unwrap_err();
    assert!(matches!(err, SourceError::Malformed { index: 0, .. }));
}
