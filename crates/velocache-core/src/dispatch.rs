//! Event fan-out to registered subscribers.
//!
//! One shared stream connection serves any number of independent consumers.
//! Each consumer registers a [`HandlerSet`] (a partial mapping from event
//! tag to callback, plus open/close lifecycle callbacks) and gets back a
//! [`Subscription`] that detaches it again. Delivery is registration-order,
//! at-most-once, with no replay for late subscribers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use velocache_api::PushEvent;
use velocache_api::models::{CacheStats, FlowRecord, RequestBegin, RequestEnd};

type Callback<T> = Box<dyn Fn(&T) + Send + Sync>;
type LogCallback = Box<dyn Fn(&str) + Send + Sync>;
type LifecycleCallback = Box<dyn Fn() + Send + Sync>;

// ── HandlerSet ───────────────────────────────────────────────────────

/// A subscriber's callbacks. Every slot is optional; events without a
/// matching callback are simply not delivered to that subscriber.
#[derive(Default)]
pub struct HandlerSet {
    on_open: Option<LifecycleCallback>,
    on_close: Option<LifecycleCallback>,
    on_stats: Option<Callback<CacheStats>>,
    on_request_begin: Option<Callback<RequestBegin>>,
    on_request_end: Option<Callback<RequestEnd>>,
    on_flow: Option<Callback<FlowRecord>>,
    on_log: Option<LogCallback>,
    on_data_changed: Option<LifecycleCallback>,
}

impl HandlerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called when the stream connection opens (including reconnects).
    pub fn on_open(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_open = Some(Box::new(f));
        self
    }

    /// Called when the stream connection closes or errors.
    pub fn on_close(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_close = Some(Box::new(f));
        self
    }

    pub fn on_stats(mut self, f: impl Fn(&CacheStats) + Send + Sync + 'static) -> Self {
        self.on_stats = Some(Box::new(f));
        self
    }

    pub fn on_request_begin(mut self, f: impl Fn(&RequestBegin) + Send + Sync + 'static) -> Self {
        self.on_request_begin = Some(Box::new(f));
        self
    }

    pub fn on_request_end(mut self, f: impl Fn(&RequestEnd) + Send + Sync + 'static) -> Self {
        self.on_request_end = Some(Box::new(f));
        self
    }

    pub fn on_flow(mut self, f: impl Fn(&FlowRecord) + Send + Sync + 'static) -> Self {
        self.on_flow = Some(Box::new(f));
        self
    }

    pub fn on_log(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_log = Some(Box::new(f));
        self
    }

    /// Called on the server's generic "data changed" signal.
    pub fn on_data_changed(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_data_changed = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for HandlerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerSet")
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_stats", &self.on_stats.is_some())
            .field("on_request_begin", &self.on_request_begin.is_some())
            .field("on_request_end", &self.on_request_end.is_some())
            .field("on_flow", &self.on_flow.is_some())
            .field("on_log", &self.on_log.is_some())
            .field("on_data_changed", &self.on_data_changed.is_some())
            .finish()
    }
}

// ── Registry ─────────────────────────────────────────────────────────

struct Entry {
    id: u64,
    handlers: HandlerSet,
}

/// Fan-out registry shared between the monitor's dispatch task and any
/// number of subscribers.
///
/// Holds no event history. Unsubscribing one entry leaves every other
/// entry and the underlying connection untouched.
#[derive(Clone)]
pub struct DispatchRegistry {
    entries: Arc<Mutex<Vec<Entry>>>,
    next_id: Arc<AtomicU64>,
}

impl Default for DispatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchRegistry {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Register a handler set. Delivery to it begins with the next
    /// dispatched event; nothing already emitted is replayed.
    pub fn subscribe(&self, handlers: HandlerSet) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push(Entry { id, handlers });
        Subscription {
            id,
            entries: Arc::downgrade(&self.entries),
        }
    }

    /// Number of live subscribers.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Deliver one decoded event to every subscriber with a matching
    /// callback, in registration order.
    pub fn dispatch_event(&self, event: &PushEvent) {
        let entries = self.lock();
        for entry in entries.iter() {
            match event {
                PushEvent::StatsUpdated { stats } => {
                    if let Some(f) = &entry.handlers.on_stats {
                        f(stats);
                    }
                }
                PushEvent::RequestBegin { request } => {
                    if let Some(f) = &entry.handlers.on_request_begin {
                        f(request);
                    }
                }
                PushEvent::RequestEnd { request } => {
                    if let Some(f) = &entry.handlers.on_request_end {
                        f(request);
                    }
                }
                PushEvent::FlowUpdated { flow } => {
                    if let Some(f) = &entry.handlers.on_flow {
                        f(flow);
                    }
                }
                PushEvent::LogLine { message } => {
                    if let Some(f) = &entry.handlers.on_log {
                        f(message);
                    }
                }
                PushEvent::DataChanged => {
                    if let Some(f) = &entry.handlers.on_data_changed {
                        f();
                    }
                }
                PushEvent::Unknown => {}
            }
        }
    }

    /// Deliver the "connection opened" lifecycle signal.
    pub fn dispatch_open(&self) {
        for entry in self.lock().iter() {
            if let Some(f) = &entry.handlers.on_open {
                f();
            }
        }
    }

    /// Deliver the "connection closed" lifecycle signal.
    pub fn dispatch_close(&self) {
        for entry in self.lock().iter() {
            if let Some(f) = &entry.handlers.on_close {
                f();
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Entry>> {
        // A panic inside a user callback must not wedge dispatch forever.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Subscription ─────────────────────────────────────────────────────

/// Handle for one registered [`HandlerSet`]. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    entries: Weak<Mutex<Vec<Entry>>>,
}

impl Subscription {
    /// Detach this subscriber now. Effective for all future dispatches;
    /// does not cancel command calls the subscriber already issued.
    pub fn unsubscribe(self) {
        // Drop impl does the work.
    }

    fn remove(&self) {
        if let Some(entries) = self.entries.upgrade() {
            entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|e| e.id != self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn log_event(message: &str) -> PushEvent {
        PushEvent::LogLine {
            message: message.to_owned(),
        }
    }

    #[test]
    fn delivers_to_matching_handlers_only() {
        let registry = DispatchRegistry::new();
        let logs = Arc::new(AtomicUsize::new(0));
        let stats = Arc::new(AtomicUsize::new(0));

        let logs_in = Arc::clone(&logs);
        let stats_in = Arc::clone(&stats);
        let _sub = registry.subscribe(
            HandlerSet::new()
                .on_log(move |_| {
                    logs_in.fetch_add(1, Ordering::SeqCst);
                })
                .on_stats(move |_| {
                    stats_in.fetch_add(1, Ordering::SeqCst);
                }),
        );

        registry.dispatch_event(&log_event("a"));
        registry.dispatch_event(&log_event("b"));
        registry.dispatch_event(&PushEvent::DataChanged);

        assert_eq!(logs.load(Ordering::SeqCst), 2);
        assert_eq!(stats.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn delivery_follows_registration_order() {
        let registry = DispatchRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let o1 = Arc::clone(&order);
        let _first = registry.subscribe(HandlerSet::new().on_log(move |_| {
            o1.lock().unwrap().push("first");
        }));
        let o2 = Arc::clone(&order);
        let _second = registry.subscribe(HandlerSet::new().on_log(move |_| {
            o2.lock().unwrap().push("second");
        }));

        registry.dispatch_event(&log_event("x"));

        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn unsubscribe_leaves_other_subscribers_alone() {
        let registry = DispatchRegistry::new();
        let kept = Arc::new(AtomicUsize::new(0));
        let removed = Arc::new(AtomicUsize::new(0));

        let kept_in = Arc::clone(&kept);
        let _kept_sub = registry.subscribe(HandlerSet::new().on_log(move |_| {
            kept_in.fetch_add(1, Ordering::SeqCst);
        }));
        let removed_in = Arc::clone(&removed);
        let removed_sub = registry.subscribe(HandlerSet::new().on_log(move |_| {
            removed_in.fetch_add(1, Ordering::SeqCst);
        }));

        registry.dispatch_event(&log_event("before"));
        removed_sub.unsubscribe();
        registry.dispatch_event(&log_event("after"));

        assert_eq!(kept.load(Ordering::SeqCst), 2);
        assert_eq!(removed.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let registry = DispatchRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        {
            let hits_in = Arc::clone(&hits);
            let _sub = registry.subscribe(HandlerSet::new().on_log(move |_| {
                hits_in.fetch_add(1, Ordering::SeqCst);
            }));
            registry.dispatch_event(&log_event("in scope"));
        }
        registry.dispatch_event(&log_event("out of scope"));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn no_replay_for_late_subscribers() {
        let registry = DispatchRegistry::new();
        registry.dispatch_event(&log_event("early"));

        let hits = Arc::new(AtomicUsize::new(0));
        let hits_in = Arc::clone(&hits);
        let _sub = registry.subscribe(HandlerSet::new().on_log(move |_| {
            hits_in.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn lifecycle_signals_reach_subscribers() {
        let registry = DispatchRegistry::new();
        let opens = Arc::new(AtomicUsize::new(0));
        let closes = Arc::new(AtomicUsize::new(0));

        let opens_in = Arc::clone(&opens);
        let closes_in = Arc::clone(&closes);
        let _sub = registry.subscribe(
            HandlerSet::new()
                .on_open(move || {
                    opens_in.fetch_add(1, Ordering::SeqCst);
                })
                .on_close(move || {
                    closes_in.fetch_add(1, Ordering::SeqCst);
                }),
        );

        registry.dispatch_open();
        registry.dispatch_close();
        registry.dispatch_open();

        assert_eq!(opens.load(Ordering::SeqCst), 2);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_events_are_not_delivered() {
        let registry = DispatchRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_in = Arc::clone(&hits);
        let _sub = registry.subscribe(HandlerSet::new().on_log(move |_| {
            hits_in.fetch_add(1, Ordering::SeqCst);
        }));

        registry.dispatch_event(&PushEvent::Unknown);

        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
