// Push-event envelope for the management event stream.
//
// Every frame the server pushes is a single JSON object tagged by a `type`
// field; the tag is the sole dispatch key. One canonical schema -- older
// servers that omit newer counter fields still decode (see `CacheStats`).

use serde::{Deserialize, Serialize};

use crate::models::{CacheStats, FlowRecord, RequestBegin, RequestEnd};

/// A decoded event from the `/api/events` stream.
///
/// Tags a server may push: `statsUpdated`, `requestBegin`, `requestEnd`,
/// `flowUpdated`, `logLine`, `dataChanged`. Anything else decodes to
/// [`Unknown`](Self::Unknown) and is ignored without error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PushEvent {
    /// Full replacement counter snapshot.
    StatsUpdated { stats: CacheStats },
    /// A request entered the proxy.
    RequestBegin { request: RequestBegin },
    /// A request completed; correlates to an earlier begin by id.
    RequestEnd { request: RequestEnd },
    /// A completed request's flow record.
    FlowUpdated { flow: FlowRecord },
    /// Free-text server log line.
    LogLine { message: String },
    /// Cache entries or rules changed server-side; resync via REST.
    DataChanged,
    /// Unrecognized tag.
    #[serde(other)]
    Unknown,
}

impl PushEvent {
    /// Decode one UTF-8 text frame into an event.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
