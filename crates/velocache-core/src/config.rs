//! Monitor configuration.
//!
//! Every timing and bound the sync core uses is a field here rather than a
//! literal in the code that needs it. The defaults match the management
//! server's reference behavior.

use std::time::Duration;

use url::Url;
use velocache_api::stream::StreamConfig;
use velocache_api::transport::TransportConfig;

/// Largest number of in-flight requests the request table retains.
pub const DEFAULT_REQUEST_TABLE_BOUND: usize = 200;

/// Retained flow records, newest first.
pub const DEFAULT_FLOW_BUFFER_BOUND: usize = 100;

/// Retained log lines, newest first.
pub const DEFAULT_LOG_BUFFER_BOUND: usize = 100;

/// Trailing window for coalescing `dataChanged` signals into one resync.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(250);

/// Proxy-status polling cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Configuration for a [`Monitor`](crate::Monitor).
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Management server base address, e.g. `http://127.0.0.1:8080`.
    pub base_url: Url,
    /// HTTP transport tuning for the command client.
    pub transport: TransportConfig,
    /// Event stream reconnection tuning.
    pub stream: StreamConfig,
    /// In-flight request table bound; the smallest id is evicted on overflow.
    pub request_table_bound: usize,
    /// Flow buffer bound.
    pub flow_buffer_bound: usize,
    /// Log buffer bound.
    pub log_buffer_bound: usize,
    /// Debounce window for cache-entry/rule resyncs.
    pub debounce_window: Duration,
    /// Interval for the proxy-status polling fallback.
    pub poll_interval: Duration,
}

impl MonitorConfig {
    /// Config for the given server with all bounds and timings at their
    /// defaults.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            transport: TransportConfig::default(),
            stream: StreamConfig::default(),
            request_table_bound: DEFAULT_REQUEST_TABLE_BOUND,
            flow_buffer_bound: DEFAULT_FLOW_BUFFER_BOUND,
            log_buffer_bound: DEFAULT_LOG_BUFFER_BOUND,
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}
