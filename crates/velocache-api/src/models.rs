// Wire models for the VeloCache management API.
//
// All payloads are camelCase JSON. These types double as the domain model:
// the server's shapes are small and stable enough that a separate conversion
// layer would add nothing.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Counters ─────────────────────────────────────────────────────────

/// Server-wide counter snapshot.
///
/// Immutable once received: each update fully replaces the previous value.
/// `data_served_from_cache_bytes` defaults to zero so payloads from servers
/// predating that counter still decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub total_requests: u64,
    pub disk_items: u64,
    pub total_disk_size_bytes: u64,
    #[serde(default)]
    pub data_served_from_cache_bytes: u64,
}

impl CacheStats {
    /// Cache hit rate in percent, or `None` before any traffic.
    pub fn hit_rate(&self) -> Option<f64> {
        if self.total_requests == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        Some(self.hits as f64 / self.total_requests as f64 * 100.0)
    }
}

// ── Request lifecycle halves ─────────────────────────────────────────

/// The "begin" half of a proxied request, pushed when the proxy accepts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBegin {
    /// Server-assigned id correlating begin and end halves.
    pub id: u64,
    pub method: String,
    pub uri: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// The "end" half, pushed once the response has been delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnd {
    pub id: u64,
    pub status_code: u16,
    pub size: u64,
    pub duration_ms: u64,
    pub is_from_cache: bool,
}

// ── Flow records ─────────────────────────────────────────────────────

/// Immutable snapshot of one completed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowRecord {
    pub id: u64,
    pub method: String,
    pub uri: String,
    pub status_code: u16,
    pub response_size_bytes: u64,
    pub is_hit: bool,
}

// ── Cache entries ────────────────────────────────────────────────────

/// One on-disk cache entry, as listed by `GET /api/entries`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Content-addressed key; also the handle for deletion.
    pub hash: String,
    pub url: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl CacheEntry {
    /// The stored `Content-Type`, without parameters.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get("content-type")
            .map(|v| v.split(';').next().unwrap_or(v).trim())
    }
}

// ── Rules ────────────────────────────────────────────────────────────

/// Match condition for a traffic rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleCondition {
    /// Exact domain match.
    Domain(String),
    /// Wildcard pattern matched against the full URL.
    UrlPattern(String),
}

/// What the proxy does with a matched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleAction {
    Allow,
    Block,
    BypassCache,
}

/// One traffic rule, as served by `GET /api/rules`.
/// Rules are evaluated server-side; the client only displays them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub name: String,
    pub condition: RuleCondition,
    pub action: RuleAction,
}

// ── Proxy / system state ─────────────────────────────────────────────

/// Proxy engine run state, as polled from `GET /api/proxy/status`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyState {
    pub running: bool,
}

/// Host descriptor used by the setup surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    /// `"linux"`, `"macos"`, `"windows"`, or `"unknown"`.
    pub os: String,
    #[serde(default)]
    pub version: Option<String>,
}

// ── Tests ────────────────────────────────────────────────────────────
