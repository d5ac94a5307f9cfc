// Monitor integration tests against a mocked management server.
//
// The event endpoint is not mocked (wiremock speaks no WebSocket), so the
// stream stays in its retry loop; a long reconnect delay keeps it quiet.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use velocache_core::{Monitor, MonitorConfig};

async fn mount_rest_api(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hits": 10, "misses": 2, "totalRequests": 12,
            "diskItems": 3, "totalDiskSizeBytes": 4096,
            "dataServedFromCacheBytes": 2048
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/entries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "hash": "a1b2c3",
                "url": "https://example.com/app.js",
                "size": 1024,
                "createdAt": "2026-08-20T10:00:00Z"
            }
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/rules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "name": "block-ads",
                "condition": { "domain": "ads.example.com" },
                "action": "block"
            }
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/proxy/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "running": true })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/system"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "os": "linux", "version": "0.4.2" })),
        )
        .mount(server)
        .await;
}

fn quiet_config(server: &MockServer) -> MonitorConfig {
    let mut config = MonitorConfig::new(server.uri().parse().unwrap());
    config.stream.reconnect_delay = Duration::from_secs(3600);
    config.poll_interval = Duration::from_secs(3600);
    config
}

#[tokio::test]
async fn start_hydrates_every_container() {
    let server = MockServer::start().await;
    mount_rest_api(&server).await;

    let monitor = Monitor::new(quiet_config(&server)).unwrap();
    monitor.start().await;

    let store = monitor.store();
    assert_eq!(store.stats().hits, 10);
    assert_eq!(store.stats().total_requests, 12);
    assert_eq!(store.entries().len(), 1);
    assert_eq!(store.entries()[0].hash, "a1b2c3");
    assert_eq!(store.rules().len(), 1);
    assert!(store.is_proxy_running());
    assert_eq!(store.system_info().unwrap().os, "linux");

    monitor.shutdown().await;
}

#[tokio::test]
async fn start_is_idempotent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hits": 1, "misses": 0, "totalRequests": 1,
            "diskItems": 0, "totalDiskSizeBytes": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let monitor = Monitor::new(quiet_config(&server)).unwrap();
    monitor.start().await;
    monitor.start().await; // second call must not hydrate again

    monitor.shutdown().await;
}

#[tokio::test]
async fn resync_burst_collapses_to_one_fetch() {
    let server = MockServer::start().await;

    // One hydration fetch plus exactly one debounced resync fetch.
    Mock::given(method("GET"))
        .and(path("/api/entries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/rules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let monitor = Monitor::new(quiet_config(&server)).unwrap();
    monitor.start().await;

    monitor.request_resync();
    monitor.request_resync();
    monitor.request_resync();

    // Past the 250 ms trailing window; the burst must have coalesced.
    tokio::time::sleep(Duration::from_millis(600)).await;

    monitor.shutdown().await;
    server.verify().await;
}

#[tokio::test]
async fn stream_open_marks_connected_and_applies_events() {
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    // A server that speaks only WebSocket. Hydration's plain HTTP requests
    // fail the handshake, which the monitor treats as non-fatal.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((sock, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(sock).await else {
                    return;
                };
                let frame = json!({
                    "type": "statsUpdated",
                    "stats": {
                        "hits": 42, "misses": 0, "totalRequests": 42,
                        "diskItems": 1, "totalDiskSizeBytes": 10
                    }
                })
                .to_string();
                if ws.send(Message::text(frame)).await.is_err() {
                    return;
                }
                while let Some(Ok(_)) = ws.next().await {}
            });
        }
    });

    let mut config = MonitorConfig::new(format!("http://{addr}").parse().unwrap());
    config.poll_interval = Duration::from_secs(3600);
    let monitor = Monitor::new(config).unwrap();
    monitor.start().await;

    // The first Opened must be seen even when the handshake completes
    // before the dispatch task gets its first poll.
    let mut connected = monitor.store().subscribe_connected();
    tokio::time::timeout(Duration::from_secs(5), connected.wait_for(|c| *c))
        .await
        .expect("stream never reported open")
        .unwrap();

    let mut stats = monitor.store().subscribe_stats();
    tokio::time::timeout(Duration::from_secs(5), stats.wait_for(|s| s.hits == 42))
        .await
        .expect("stats event never applied")
        .unwrap();

    monitor.shutdown().await;
}

#[tokio::test]
async fn startup_survives_a_dead_server() {
    let server = MockServer::start().await;
    let config = quiet_config(&server);
    drop(server);

    let monitor = Monitor::new(config).unwrap();
    monitor.start().await;

    // Hydration failed everywhere; the store is empty but usable.
    let store = monitor.store();
    assert_eq!(store.stats().total_requests, 0);
    assert!(store.entries().is_empty());
    assert!(!store.is_connected());

    monitor.shutdown().await;
}
