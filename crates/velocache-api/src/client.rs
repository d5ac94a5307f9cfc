// Management API HTTP client
//
// Wraps `reqwest::Client` with VeloCache-specific URL construction and
// response handling. Every call is one round trip: no retries, no caching --
// callers own whatever retry policy they want.

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{CacheEntry, CacheStats, ProxyState, Rule, SystemInfo};
use crate::transport::TransportConfig;

/// One-shot request/response client for the VeloCache management API.
///
/// Stateless beyond the base address. A non-success response becomes
/// [`Error::Api`] carrying the body's detail text when the server provided
/// one; the parsed payload is returned on success.
pub struct ManagementClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ManagementClient {
    /// Create a new client from a base address (e.g. `http://127.0.0.1:8080`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The management base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for a management API path: `{base}/api/{path}`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let joined = self.base_url.join(&format!("api/{path}"))?;
        Ok(joined)
    }

    /// Derive the event-stream endpoint from the base address.
    ///
    /// Maps `http` -> `ws` and `https` -> `wss`, path `/api/events`.
    pub fn events_url(&self) -> Result<Url, Error> {
        let mut url = self.api_url("events")?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| Error::StreamConnect(format!("cannot derive stream scheme for {url}")))?;
        Ok(url)
    }

    // ── Read endpoints ───────────────────────────────────────────────

    /// Fetch the current counter snapshot.
    pub async fn fetch_stats(&self) -> Result<CacheStats, Error> {
        self.get_json(self.api_url("stats")?).await
    }

    /// List all on-disk cache entries.
    pub async fn list_entries(&self) -> Result<Vec<CacheEntry>, Error> {
        self.get_json(self.api_url("entries")?).await
    }

    /// List the configured traffic rules.
    pub async fn list_rules(&self) -> Result<Vec<Rule>, Error> {
        self.get_json(self.api_url("rules")?).await
    }

    /// Fetch the proxy engine's run state.
    pub async fn proxy_state(&self) -> Result<ProxyState, Error> {
        self.get_json(self.api_url("proxy/status")?).await
    }

    /// Fetch the host/system descriptor.
    pub async fn system_info(&self) -> Result<SystemInfo, Error> {
        self.get_json(self.api_url("system")?).await
    }

    /// Download the CA certificate (PEM bytes).
    pub async fn fetch_ca_certificate(&self) -> Result<Vec<u8>, Error> {
        let url = self.api_url("ca.crt")?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(api_error(status, body));
        }
        let bytes = resp.bytes().await.map_err(Error::Transport)?;
        Ok(bytes.to_vec())
    }

    // ── Command endpoints ────────────────────────────────────────────

    /// Clear the entire cache.
    pub async fn clear_cache(&self) -> Result<(), Error> {
        self.post_ok(self.api_url("clear")?).await
    }

    /// Delete a single cache entry by hash.
    pub async fn delete_entry(&self, hash: &str) -> Result<(), Error> {
        let url = self.api_url(&format!("entries/{hash}"))?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await.map_err(Error::Transport)?;
        check_status(resp).await
    }

    /// Start the proxy engine.
    pub async fn start_proxy(&self) -> Result<(), Error> {
        self.post_ok(self.api_url("proxy/start")?).await
    }

    /// Stop the proxy engine.
    pub async fn stop_proxy(&self) -> Result<(), Error> {
        self.post_ok(self.api_url("proxy/stop")?).await
    }

    /// Point the OS proxy settings at VeloCache.
    pub async fn enable_system_proxy(&self) -> Result<(), Error> {
        self.post_ok(self.api_url("system-proxy/enable")?).await
    }

    /// Restore the OS proxy settings.
    pub async fn disable_system_proxy(&self) -> Result<(), Error> {
        self.post_ok(self.api_url("system-proxy/disable")?).await
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and parse the JSON payload.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {url}");

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        parse_json(resp).await
    }

    /// Send a bodyless POST, succeeding on any 2xx.
    async fn post_ok(&self, url: Url) -> Result<(), Error> {
        debug!("POST {url}");

        let resp = self.http.post(url).send().await.map_err(Error::Transport)?;
        check_status(resp).await
    }
}

/// Parse a JSON body after checking the status line.
async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    let body = resp.text().await.map_err(Error::Transport)?;

    if !status.is_success() {
        return Err(api_error(status, body));
    }

    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}

/// Succeed on 2xx, otherwise surface the body as the error detail.
async fn check_status(resp: reqwest::Response) -> Result<(), Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let body = resp.text().await.unwrap_or_default();
    Err(api_error(status, body))
}

fn api_error(status: reqwest::StatusCode, body: String) -> Error {
    let detail = body.trim();
    let message = if detail.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_owned()
    } else {
        detail.to_owned()
    };
    Error::Api {
        status: status.as_u16(),
        message,
    }
}

// ── Tests ────────────────────────────────────────────────────────────
