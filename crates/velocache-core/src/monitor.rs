//! Process-scoped sync owner.
//!
//! The `Monitor` ties the pieces together: it owns the command client, the
//! event stream, the dispatch registry, and the state store, plus the
//! background tasks that keep them consistent. Construct exactly one per
//! process and clone the handle wherever state access is needed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use velocache_api::ManagementClient;
use velocache_api::stream::{EventStream, StreamUpdate};

use crate::config::MonitorConfig;
use crate::dispatch::{DispatchRegistry, HandlerSet, Subscription};
use crate::error::CoreError;
use crate::store::{Debounce, StateStore};

// ── Monitor ──────────────────────────────────────────────────────────

/// Live state synchronization owner.
///
/// Cheaply cloneable via `Arc`. [`start()`](Self::start) hydrates the
/// store over REST, then spawns the dispatch, resync, and polling tasks
/// and opens the event stream. Calling it again is a no-op.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    config: MonitorConfig,
    client: ManagementClient,
    store: Arc<StateStore>,
    registry: DispatchRegistry,
    stream: EventStream,
    resync_tx: mpsc::UnboundedSender<()>,
    resync_rx: Mutex<Option<mpsc::UnboundedReceiver<()>>>,
    resync_sub: Mutex<Option<Subscription>>,
    cancel: CancellationToken,
    started: AtomicBool,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Monitor {
    /// Build the monitor from configuration. Nothing connects until
    /// [`start()`](Self::start).
    pub fn new(config: MonitorConfig) -> Result<Self, CoreError> {
        let client = ManagementClient::new(config.base_url.clone(), &config.transport)?;
        let events_url = client.events_url()?;
        let cancel = CancellationToken::new();
        let stream = EventStream::new(events_url, config.stream.clone(), cancel.clone());
        let store = Arc::new(StateStore::new(&config));
        let (resync_tx, resync_rx) = mpsc::unbounded_channel();

        Ok(Self {
            inner: Arc::new(MonitorInner {
                config,
                client,
                store,
                registry: DispatchRegistry::new(),
                stream,
                resync_tx,
                resync_rx: Mutex::new(Some(resync_rx)),
                resync_sub: Mutex::new(None),
                cancel,
                started: AtomicBool::new(false),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    /// The one-shot command client, for mutations the store does not cover.
    pub fn client(&self) -> &ManagementClient {
        &self.inner.client
    }

    /// The mirrored server state.
    pub fn store(&self) -> &Arc<StateStore> {
        &self.inner.store
    }

    /// Register a handler set for push events and lifecycle signals.
    pub fn subscribe(&self, handlers: HandlerSet) -> Subscription {
        self.inner.registry.subscribe(handlers)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Hydrate the store, spawn background tasks, open the event stream.
    ///
    /// Idempotent: a second call while running is a no-op. Hydration
    /// failures are logged and retried implicitly on the next reconnect;
    /// a server that is down at startup just means an empty store and a
    /// visible disconnected flag.
    pub async fn start(&self) {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            debug!("monitor already started, ignoring");
            return;
        }

        self.hydrate().await;

        // dataChanged signals funnel through a registered handler set like
        // any other subscriber, then coalesce in the resync task.
        let resync_tx = self.inner.resync_tx.clone();
        let sub = self.inner.registry.subscribe(HandlerSet::new().on_data_changed(move || {
            let _ = resync_tx.send(());
        }));
        *self.inner.resync_sub.lock().await = Some(sub);

        let mut handles = self.inner.task_handles.lock().await;

        // Subscribe before the stream opens: if the dispatch task's first
        // poll is late, the first Opened still sits in the channel instead
        // of being missed until the next reconnect.
        let updates = self.inner.stream.subscribe();
        let monitor = self.clone();
        handles.push(tokio::spawn(dispatch_task(monitor, updates)));

        if let Some(rx) = self.inner.resync_rx.lock().await.take() {
            let monitor = self.clone();
            handles.push(tokio::spawn(resync_task(monitor, rx)));
        }

        let monitor = self.clone();
        handles.push(tokio::spawn(poll_task(monitor)));

        drop(handles);

        self.inner.stream.start();
        info!("monitor started");
    }

    /// Cancel background tasks and wait for them to exit.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        self.inner.stream.shutdown();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("monitor shut down");
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start the proxy engine and reflect the new state locally.
    pub async fn start_proxy(&self) -> Result<(), CoreError> {
        self.inner.client.start_proxy().await?;
        self.inner.store.set_proxy_running(true);
        Ok(())
    }

    /// Stop the proxy engine and reflect the new state locally.
    pub async fn stop_proxy(&self) -> Result<(), CoreError> {
        self.inner.client.stop_proxy().await?;
        self.inner.store.set_proxy_running(false);
        Ok(())
    }

    /// Ask for a cache-entry/rule resync. Coalesced with push-driven
    /// `dataChanged` signals through the same debounce window.
    pub fn request_resync(&self) {
        let _ = self.inner.resync_tx.send(());
    }

    // ── Synchronization internals ────────────────────────────────────

    /// Pull every REST-backed container once. Individual failures are
    /// non-fatal; whatever fetched is applied.
    async fn hydrate(&self) {
        let client = &self.inner.client;
        let store = &self.inner.store;

        let (stats, entries, rules, proxy, system) = tokio::join!(
            client.fetch_stats(),
            client.list_entries(),
            client.list_rules(),
            client.proxy_state(),
            client.system_info(),
        );

        match stats {
            Ok(stats) => store.replace_stats(stats),
            Err(e) => warn!(error = %e, "stats hydration failed"),
        }
        match entries {
            Ok(entries) => store.replace_entries(entries),
            Err(e) => warn!(error = %e, "entry hydration failed"),
        }
        match rules {
            Ok(rules) => store.replace_rules(rules),
            Err(e) => warn!(error = %e, "rule hydration failed"),
        }
        match proxy {
            Ok(state) => store.set_proxy_running(state.running),
            Err(e) => warn!(error = %e, "proxy state hydration failed"),
        }
        match system {
            Ok(info) => store.set_system_info(info),
            Err(e) => warn!(error = %e, "system descriptor hydration failed"),
        }

        debug!("hydration complete");
    }

    /// Re-fetch the full-replacement snapshots (entries and rules).
    async fn resync(&self) {
        let client = &self.inner.client;
        let store = &self.inner.store;

        let (entries, rules) = tokio::join!(client.list_entries(), client.list_rules());

        match entries {
            Ok(entries) => store.replace_entries(entries),
            Err(e) => warn!(error = %e, "entry resync failed"),
        }
        match rules {
            Ok(rules) => store.replace_rules(rules),
            Err(e) => warn!(error = %e, "rule resync failed"),
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Route stream updates into the store and the registry.
///
/// A reconnect is a potential state gap, so every `Opened` re-hydrates
/// the REST-backed containers before consumers are told about it.
async fn dispatch_task(monitor: Monitor, mut rx: broadcast::Receiver<StreamUpdate>) {
    let inner = &monitor.inner;

    loop {
        tokio::select! {
            biased;
            _ = inner.cancel.cancelled() => break,
            update = rx.recv() => {
                match update {
                    Ok(StreamUpdate::Opened) => {
                        inner.store.set_connected(true);
                        monitor.hydrate().await;
                        inner.registry.dispatch_open();
                    }
                    Ok(StreamUpdate::Closed) => {
                        inner.store.set_connected(false);
                        inner.registry.dispatch_close();
                    }
                    Ok(StreamUpdate::Event(event)) => {
                        inner.store.apply(&event);
                        inner.registry.dispatch_event(&event);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                        // Dropped updates are a state gap; resync the
                        // snapshots we cannot replay.
                        warn!(missed, "dispatch lagged behind the stream");
                        let _ = inner.resync_tx.send(());
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

/// Own the debounce machine: collect triggers, fire one resync per
/// trailing window.
async fn resync_task(monitor: Monitor, mut rx: mpsc::UnboundedReceiver<()>) {
    let inner = &monitor.inner;
    let mut debounce = Debounce::new(inner.config.debounce_window);

    loop {
        if let Some(at) = debounce.deadline() {
            tokio::select! {
                biased;
                _ = inner.cancel.cancelled() => break,
                _ = tokio::time::sleep_until(at) => {
                    if debounce.fire(Instant::now()) {
                        monitor.resync().await;
                    }
                }
                signal = rx.recv() => {
                    if signal.is_none() {
                        break;
                    }
                    debounce.trigger(Instant::now());
                }
            }
        } else {
            tokio::select! {
                biased;
                _ = inner.cancel.cancelled() => break,
                signal = rx.recv() => {
                    if signal.is_none() {
                        break;
                    }
                    debounce.trigger(Instant::now());
                }
            }
        }
    }
}

/// Polling fallback for the proxy-running flag, which the push channel
/// does not carry. Keeps running while the stream is disconnected.
async fn poll_task(monitor: Monitor) {
    let inner = &monitor.inner;
    let mut interval = tokio::time::interval(inner.config.poll_interval);
    interval.tick().await; // hydration already covered the first fetch

    loop {
        tokio::select! {
            biased;
            _ = inner.cancel.cancelled() => break,
            _ = interval.tick() => {
                match inner.client.proxy_state().await {
                    Ok(state) => inner.store.set_proxy_running(state.running),
                    Err(e) => debug!(error = %e, "proxy status poll failed"),
                }
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use velocache_api::PushEvent;

    use super::*;

    #[tokio::test]
    async fn handler_events_flow_through_subscribe() {
        let config = MonitorConfig::new("http://127.0.0.1:9".parse().unwrap());
        let monitor = Monitor::new(config).unwrap();

        let seen = Arc::new(AtomicBool::new(false));
        let seen_in = Arc::clone(&seen);
        let _sub = monitor.subscribe(HandlerSet::new().on_log(move |_| {
            seen_in.store(true, Ordering::SeqCst);
        }));

        monitor.inner.registry.dispatch_event(&PushEvent::LogLine {
            message: "hello".to_owned(),
        });

        assert!(seen.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn data_changed_burst_coalesces_into_one_resync() {
        use std::time::Duration;

        use serde_json::json;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

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

        let mut config = MonitorConfig::new(server.uri().parse().unwrap());
        config.stream.reconnect_delay = Duration::from_secs(3600);
        config.poll_interval = Duration::from_secs(3600);
        let monitor = Monitor::new(config).unwrap();
        monitor.start().await;

        // Dispatch through the registry, the same path a decoded
        // dataChanged frame takes, so the registered handler glue and
        // the resync task both run.
        for _ in 0..3 {
            monitor.inner.registry.dispatch_event(&PushEvent::DataChanged);
        }
        tokio::time::sleep(Duration::from_millis(600)).await;

        monitor.shutdown().await;
        server.verify().await;
    }

    #[tokio::test]
    async fn stop_proxy_requires_a_server() {
        // No server listening: the command fails and the flag is untouched.
        let config = MonitorConfig::new("http://127.0.0.1:9".parse().unwrap());
        let monitor = Monitor::new(config).unwrap();

        assert!(monitor.stop_proxy().await.is_err());
        assert!(!monitor.store().is_proxy_running());
    }
}
