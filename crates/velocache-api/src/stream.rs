//! WebSocket event stream with auto-reconnect.
//!
//! Connects to the management server's `/api/events` endpoint and forwards
//! decoded [`PushEvent`]s plus lifecycle signals through a
//! [`tokio::sync::broadcast`] channel. Reconnects forever on a fixed delay;
//! a disconnected dashboard shows an indicator rather than giving up.
//!
//! # Example
//!
//! ```rust,ignore
//! use velocache_api::stream::{EventStream, StreamConfig, StreamUpdate};
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel = CancellationToken::new();
//! let url = "ws://127.0.0.1:8080/api/events".parse()?;
//!
//! let stream = EventStream::new(url, StreamConfig::default(), cancel.clone());
//! let mut rx = stream.subscribe();
//! stream.start();
//!
//! while let Ok(update) = rx.recv().await {
//!     if let StreamUpdate::Event(event) = update {
//!         println!("{event:?}");
//!     }
//! }
//!
//! stream.shutdown();
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::{broadcast, watch};
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::events::PushEvent;

// ── Broadcast channel capacity ───────────────────────────────────────

const UPDATE_CHANNEL_CAPACITY: usize = 1024;

// ── StreamConfig ─────────────────────────────────────────────────────

/// Reconnection tuning for the event stream.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Fixed delay between reconnection attempts. Default: 3s.
    /// Retries are unbounded.
    pub reconnect_delay: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_millis(3000),
        }
    }
}

// ── Connection state ─────────────────────────────────────────────────

/// Observable connection state of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Disconnected,
    Connecting,
    Open,
}

// ── StreamUpdate ─────────────────────────────────────────────────────

/// What the transport forwards to consumers: lifecycle signals and
/// decoded events, in arrival order within one connection's lifetime.
#[derive(Debug, Clone)]
pub enum StreamUpdate {
    /// Handshake completed; consumers should treat a reopen as a
    /// potential state gap and re-hydrate over REST.
    Opened,
    /// The connection closed or errored.
    Closed,
    /// One decoded push event.
    Event(PushEvent),
}

// ── EventStream ──────────────────────────────────────────────────────

/// Owns the single streaming connection to the server's event endpoint.
///
/// `start()` is idempotent: a second call while the loop is pending or
/// open is a no-op, so at most one socket exists per instance.
pub struct EventStream {
    url: Url,
    config: StreamConfig,
    update_tx: broadcast::Sender<StreamUpdate>,
    state_tx: Arc<watch::Sender<StreamState>>,
    cancel: CancellationToken,
    running: AtomicBool,
}

impl EventStream {
    /// Create a stream for the given `ws://`/`wss://` endpoint.
    /// No connection is made until [`start`](Self::start).
    pub fn new(url: Url, config: StreamConfig, cancel: CancellationToken) -> Self {
        let (update_tx, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        let (state_tx, _) = watch::channel(StreamState::Disconnected);

        Self {
            url,
            config,
            update_tx,
            state_tx: Arc::new(state_tx),
            cancel,
            running: AtomicBool::new(false),
        }
    }

    /// Begin the connect/reconnect lifecycle. Idempotent.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::debug!("event stream already started, ignoring");
            return;
        }

        let url = self.url.clone();
        let update_tx = self.update_tx.clone();
        let state_tx = Arc::clone(&self.state_tx);
        let delay = self.config.reconnect_delay;
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            stream_loop(url, &update_tx, &state_tx, delay, &cancel).await;
        });
    }

    /// Get a new receiver for updates. No replay: updates emitted before
    /// subscribing are never delivered.
    pub fn subscribe(&self) -> broadcast::Receiver<StreamUpdate> {
        self.update_tx.subscribe()
    }

    /// Observe connection state transitions.
    pub fn state(&self) -> watch::Receiver<StreamState> {
        self.state_tx.subscribe()
    }

    /// Signal the background loop to shut down.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read → on close or error, wait the fixed delay →
/// reconnect. Runs until cancelled; there is no retry cap.
async fn stream_loop(
    url: Url,
    update_tx: &broadcast::Sender<StreamUpdate>,
    state_tx: &watch::Sender<StreamState>,
    delay: Duration,
    cancel: &CancellationToken,
) {
    loop {
        let _ = state_tx.send(StreamState::Connecting);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = connect_and_read(&url, update_tx, state_tx, cancel) => {
                let _ = state_tx.send(StreamState::Disconnected);

                match result {
                    Ok(()) => tracing::info!("event stream disconnected, reconnecting"),
                    Err(e) => tracing::warn!(error = %e, "event stream error"),
                }

                if cancel.is_cancelled() {
                    break;
                }

                tracing::debug!(delay_ms = delay.as_millis() as u64, "waiting before reconnect");
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }

    let _ = state_tx.send(StreamState::Disconnected);
    tracing::debug!("event stream loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish one WebSocket connection and read frames until it drops.
///
/// Signals `Opened` after a successful handshake and `Closed` when the
/// connection goes away, regardless of how. A failed handshake emits
/// neither -- the stream was never open.
async fn connect_and_read(
    url: &Url,
    update_tx: &broadcast::Sender<StreamUpdate>,
    state_tx: &watch::Sender<StreamState>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::debug!(url = %url, "connecting to event stream");

    let uri: tungstenite::http::Uri = url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::StreamConnect(e.to_string()))?;
    let request = ClientRequestBuilder::new(uri);

    let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| Error::StreamConnect(e.to_string()))?;

    tracing::info!("event stream connected");
    let _ = state_tx.send(StreamState::Open);
    let _ = update_tx.send(StreamUpdate::Opened);

    let (_write, mut read) = ws_stream.split();

    let result = loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break Ok(()),
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        decode_and_forward(&text, update_tx);
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite answers pongs automatically
                        tracing::trace!("event stream ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(code = %cf.code, reason = %cf.reason, "close frame received");
                        } else {
                            tracing::info!("close frame received (no payload)");
                        }
                        break Ok(());
                    }
                    Some(Err(e)) => {
                        break Err(Error::StreamConnect(e.to_string()));
                    }
                    None => {
                        // Stream ended without a close frame
                        tracing::info!("event stream ended");
                        break Ok(());
                    }
                    _ => {
                        // Binary, Pong, Frame -- ignore
                    }
                }
            }
        }
    };

    // Errors never leave the connection half-torn-down: the socket is gone
    // either way, and consumers always see exactly one Closed per Opened.
    let _ = update_tx.send(StreamUpdate::Closed);
    result
}

// ── Frame decoding ───────────────────────────────────────────────────

/// Decode one text frame and forward the event.
///
/// A frame that fails to decode is dropped with a diagnostic -- it never
/// tears down the connection. Unknown tags are ignored here.
fn decode_and_forward(text: &str, update_tx: &broadcast::Sender<StreamUpdate>) {
    match PushEvent::decode(text) {
        Ok(PushEvent::Unknown) => {
            tracing::trace!("ignoring event with unknown tag");
        }
        Ok(event) => {
            // Send errors just mean no active subscribers right now
            let _ = update_tx.send(StreamUpdate::Event(event));
        }
        Err(e) => {
            tracing::debug!(error = %e, "dropping malformed event frame");
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
