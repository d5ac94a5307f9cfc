// Integration tests for `ManagementClient` using wiremock.

#![allow(clippy::unwrap_used)]

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use velocache_api::models::{RuleAction, RuleCondition};
use velocache_api::{Error, ManagementClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ManagementClient) {
    let server = MockServer::start().await;
    let client = ManagementClient::with_client(
        reqwest::Client::new(),
        server.uri().parse().unwrap(),
    );
    (server, client)
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_stats() {
    let (server, client) = setup().await;

    let body = json!({
        "hits": 10,
        "misses": 2,
        "totalRequests": 12,
        "diskItems": 5,
        "totalDiskSizeBytes": 123_456,
        "dataServedFromCacheBytes": 98_304
    });

    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let stats = client.fetch_stats().await.unwrap();

    assert_eq!(stats.hits, 10);
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.total_requests, 12);
    assert_eq!(stats.data_served_from_cache_bytes, 98_304);
}

#[tokio::test]
async fn test_list_entries() {
    let (server, client) = setup().await;

    let body = json!([
        {
            "hash": "a1b2c3",
            "url": "https://crates.io/api/v1/crates",
            "size": 4096,
            "createdAt": "2026-08-20T10:00:00Z",
            "headers": { "content-type": "application/json; charset=utf-8" }
        },
        {
            "hash": "d4e5f6",
            "url": "https://example.com/logo.png",
            "size": 2048,
            "createdAt": "2026-08-21T09:30:00Z"
        }
    ]);

    Mock::given(method("GET"))
        .and(path("/api/entries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let entries = client.list_entries().await.unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].hash, "a1b2c3");
    assert_eq!(entries[0].content_type(), Some("application/json"));
    // headers are optional on the wire
    assert!(entries[1].headers.is_empty());
}

#[tokio::test]
async fn test_list_rules() {
    let (server, client) = setup().await;

    let body = json!([
        {
            "name": "block-ads",
            "condition": { "urlPattern": "*://ads.example.com/*" },
            "action": "block"
        },
        {
            "name": "never-cache-api",
            "condition": { "domain": "api.internal" },
            "action": "bypassCache"
        }
    ]);

    Mock::given(method("GET"))
        .and(path("/api/rules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let rules = client.list_rules().await.unwrap();

    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].action, RuleAction::Block);
    assert_eq!(
        rules[1].condition,
        RuleCondition::Domain("api.internal".into())
    );
}

#[tokio::test]
async fn test_proxy_state_and_commands() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/proxy/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "running": true })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/proxy/stop"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Proxy stopped"))
        .mount(&server)
        .await;

    assert!(client.proxy_state().await.unwrap().running);
    client.stop_proxy().await.unwrap();
}

#[tokio::test]
async fn test_clear_cache_and_delete_entry() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/clear"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Cache cleared"))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/entries/a1b2c3"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    client.clear_cache().await.unwrap();
    client.delete_entry("a1b2c3").await.unwrap();
}

#[tokio::test]
async fn test_fetch_ca_certificate() {
    let (server, client) = setup().await;

    let pem = b"-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n";

    Mock::given(method("GET"))
        .and(path("/api/ca.crt"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(pem.as_slice()))
        .mount(&server)
        .await;

    let bytes = client.fetch_ca_certificate().await.unwrap();
    assert_eq!(bytes, pem);
}

#[tokio::test]
async fn test_system_info() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/system"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "os": "linux", "version": "0.4.2" })),
        )
        .mount(&server)
        .await;

    let info = client.system_info().await.unwrap();
    assert_eq!(info.os, "linux");
    assert_eq!(info.version.as_deref(), Some("0.4.2"));
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_error_carries_server_detail() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/clear"))
        .respond_with(ResponseTemplate::new(500).set_body_string("disk is read-only"))
        .mount(&server)
        .await;

    let result = client.clear_cache().await;

    match result {
        Err(Error::Api { status, ref message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "disk is read-only");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_error_empty_body_falls_back_to_status_reason() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/entries/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = client.delete_entry("missing").await;

    match result {
        Err(ref e @ Error::Api { status, ref message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Not Found");
            assert!(e.is_not_found());
        }
        other => panic!("expected Api 404 error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_deserialization_error_keeps_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.fetch_stats().await;

    match result {
        Err(Error::Deserialization { ref body, .. }) => {
            assert_eq!(body, "<html>oops</html>");
        }
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}
