use thiserror::Error;

/// Top-level error type for the `velocache-api` crate.
///
/// Covers every failure mode across both API surfaces: the one-shot
/// management REST calls and the WebSocket event stream.
/// `velocache-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Management API ──────────────────────────────────────────────
    /// Non-success response from a management endpoint.
    ///
    /// `message` carries the response body's detail text when the server
    /// provided one, otherwise the canonical status reason.
    #[error("Management API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Event stream ────────────────────────────────────────────────
    /// WebSocket connection failed or dropped abnormally.
    #[error("Event stream connection failed: {0}")]
    StreamConnect(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::StreamConnect(_) => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}
