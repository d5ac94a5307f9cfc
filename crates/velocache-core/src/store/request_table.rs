//! Two-phase in-flight request table.
//!
//! Requests arrive as two halves correlated by a server-assigned id: the
//! begin half when the proxy accepts a request, the end half once the
//! response is delivered. The table merges them and bounds its size by
//! evicting the oldest (smallest id) entry.

use std::collections::BTreeMap;

use velocache_api::models::{RequestBegin, RequestEnd};

/// One tracked request: its begin half plus, once completed, its end half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEntry {
    pub begin: RequestBegin,
    pub end: Option<RequestEnd>,
}

impl RequestEntry {
    pub fn is_complete(&self) -> bool {
        self.end.is_some()
    }
}

/// Bounded table of in-flight and recently completed requests, keyed by id.
#[derive(Debug, Clone)]
pub struct RequestTable {
    entries: BTreeMap<u64, RequestEntry>,
    bound: usize,
}

impl RequestTable {
    pub fn new(bound: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            bound,
        }
    }

    /// Insert the begin half. Over the bound, the entry with the smallest
    /// id is evicted; server ids are monotonic, so smallest means oldest.
    pub fn insert_begin(&mut self, begin: RequestBegin) {
        self.entries
            .insert(begin.id, RequestEntry { begin, end: None });
        while self.entries.len() > self.bound {
            self.entries.pop_first();
        }
    }

    /// Merge the end half into its entry. An end with no matching begin is
    /// dropped; the begin may have been evicted or never seen.
    pub fn merge_end(&mut self, end: RequestEnd) {
        if let Some(entry) = self.entries.get_mut(&end.id) {
            entry.end = Some(end);
        } else {
            tracing::trace!(id = end.id, "dropping end half with no matching begin");
        }
    }

    pub fn get(&self, id: u64) -> Option<&RequestEntry> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending id order (oldest first).
    pub fn iter(&self) -> impl Iterator<Item = (&u64, &RequestEntry)> {
        self.entries.iter()
    }
}
