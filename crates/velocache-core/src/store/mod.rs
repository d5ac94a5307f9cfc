//! Reactive state store.
//!
//! Owns every container of mirrored server state. Each container is backed
//! by a `watch` channel: reads are cheap clones of the current value and
//! consumers subscribe to change notifications. Mutation happens only
//! through the reconciliation methods here, driven by dispatched events
//! and command-client responses.

pub mod bounded;
pub mod debounce;
pub mod request_table;

use tokio::sync::watch;

use velocache_api::PushEvent;
use velocache_api::models::{
    CacheEntry, CacheStats, FlowRecord, RequestBegin, RequestEnd, Rule, SystemInfo,
};

pub use bounded::BoundedBuffer;
pub use debounce::Debounce;
pub use request_table::{RequestEntry, RequestTable};

use crate::config::MonitorConfig;

/// All mirrored server state, one watch-backed container per concern.
pub struct StateStore {
    stats: watch::Sender<CacheStats>,
    requests: watch::Sender<RequestTable>,
    flows: watch::Sender<BoundedBuffer<FlowRecord>>,
    logs: watch::Sender<BoundedBuffer<String>>,
    entries: watch::Sender<Vec<CacheEntry>>,
    rules: watch::Sender<Vec<Rule>>,
    connected: watch::Sender<bool>,
    proxy_running: watch::Sender<bool>,
    system: watch::Sender<Option<SystemInfo>>,
}

impl StateStore {
    pub fn new(config: &MonitorConfig) -> Self {
        let (stats, _) = watch::channel(CacheStats::default());
        let (requests, _) = watch::channel(RequestTable::new(config.request_table_bound));
        let (flows, _) = watch::channel(BoundedBuffer::new(config.flow_buffer_bound));
        let (logs, _) = watch::channel(BoundedBuffer::new(config.log_buffer_bound));
        let (entries, _) = watch::channel(Vec::new());
        let (rules, _) = watch::channel(Vec::new());
        let (connected, _) = watch::channel(false);
        let (proxy_running, _) = watch::channel(false);
        let (system, _) = watch::channel(None);

        Self {
            stats,
            requests,
            flows,
            logs,
            entries,
            rules,
            connected,
            proxy_running,
            system,
        }
    }

    // ── Reconciliation ───────────────────────────────────────────────

    /// Apply one dispatched event to its container.
    ///
    /// `DataChanged` is not handled here; the monitor routes it into the
    /// debounced resync instead. `Unknown` never reaches this point.
    pub fn apply(&self, event: &PushEvent) {
        match event {
            PushEvent::StatsUpdated { stats } => self.replace_stats(stats.clone()),
            PushEvent::RequestBegin { request } => self.apply_request_begin(request.clone()),
            PushEvent::RequestEnd { request } => self.apply_request_end(request.clone()),
            PushEvent::FlowUpdated { flow } => self.push_flow(flow.clone()),
            PushEvent::LogLine { message } => self.push_log(message.clone()),
            PushEvent::DataChanged | PushEvent::Unknown => {}
        }
    }

    /// Full replacement: each snapshot supersedes the previous one.
    pub fn replace_stats(&self, stats: CacheStats) {
        self.stats.send_replace(stats);
    }

    pub fn apply_request_begin(&self, begin: RequestBegin) {
        self.requests.send_modify(|table| table.insert_begin(begin));
    }

    pub fn apply_request_end(&self, end: RequestEnd) {
        self.requests.send_modify(|table| table.merge_end(end));
    }

    pub fn push_flow(&self, flow: FlowRecord) {
        self.flows.send_modify(|buf| buf.push(flow));
    }

    pub fn push_log(&self, line: String) {
        self.logs.send_modify(|buf| buf.push(line));
    }

    pub fn replace_entries(&self, entries: Vec<CacheEntry>) {
        self.entries.send_replace(entries);
    }

    pub fn replace_rules(&self, rules: Vec<Rule>) {
        self.rules.send_replace(rules);
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.send_replace(connected);
    }

    pub fn set_proxy_running(&self, running: bool) {
        self.proxy_running.send_replace(running);
    }

    pub fn set_system_info(&self, info: SystemInfo) {
        self.system.send_replace(Some(info));
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn stats(&self) -> CacheStats {
        self.stats.borrow().clone()
    }

    pub fn requests(&self) -> RequestTable {
        self.requests.borrow().clone()
    }

    pub fn flows(&self) -> BoundedBuffer<FlowRecord> {
        self.flows.borrow().clone()
    }

    pub fn logs(&self) -> BoundedBuffer<String> {
        self.logs.borrow().clone()
    }

    pub fn entries(&self) -> Vec<CacheEntry> {
        self.entries.borrow().clone()
    }

    pub fn rules(&self) -> Vec<Rule> {
        self.rules.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    pub fn is_proxy_running(&self) -> bool {
        *self.proxy_running.borrow()
    }

    pub fn system_info(&self) -> Option<SystemInfo> {
        self.system.borrow().clone()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_stats(&self) -> watch::Receiver<CacheStats> {
        self.stats.subscribe()
    }

    pub fn subscribe_requests(&self) -> watch::Receiver<RequestTable> {
        self.requests.subscribe()
    }

    pub fn subscribe_flows(&self) -> watch::Receiver<BoundedBuffer<FlowRecord>> {
        self.flows.subscribe()
    }

    pub fn subscribe_logs(&self) -> watch::Receiver<BoundedBuffer<String>> {
        self.logs.subscribe()
    }

    pub fn subscribe_entries(&self) -> watch::Receiver<Vec<CacheEntry>> {
        self.entries.subscribe()
    }

    pub fn subscribe_rules(&self) -> watch::Receiver<Vec<Rule>> {
        self.rules.subscribe()
    }

    pub fn subscribe_connected(&self) -> watch::Receiver<bool> {
        self.connected.subscribe()
    }

    pub fn subscribe_proxy_running(&self) -> watch::Receiver<bool> {
        self.proxy_running.subscribe()
    }
}

// ── Tests ────────────────────────────────────────────────────────────
