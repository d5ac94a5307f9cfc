//! CLI error types with miette diagnostics.
//!
//! Maps transport and core errors into user-facing errors with actionable
//! help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use velocache_core::CoreError;

/// Exit codes for process termination.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the VeloCache server at {url}")]
    #[diagnostic(
        code(velo::connection_failed),
        help(
            "Check that VeloCache is running and accessible.\n\
             URL: {url}\n\
             Override with --server or VELOCACHE_SERVER."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out")]
    #[diagnostic(
        code(velo::timeout),
        help("Increase the timeout with --timeout or check server responsiveness.")
    )]
    Timeout {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── API ──────────────────────────────────────────────────────────

    #[error("Server rejected the request ({status}): {message}")]
    #[diagnostic(code(velo::api_error))]
    Api { status: u16, message: String },

    #[error("{resource} '{identifier}' not found")]
    #[diagnostic(code(velo::not_found), help("Run: velo {list_command} to see what exists"))]
    NotFound {
        resource: String,
        identifier: String,
        list_command: String,
    },

    #[error("Unexpected response from the server: {message}")]
    #[diagnostic(
        code(velo::bad_response),
        help("The address may point at something that is not a VeloCache management API.")
    )]
    BadResponse { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(velo::validation))]
    Validation { field: String, reason: String },

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(velo::confirmation_required),
        help("Re-run with --yes (-y) to confirm.")
    )]
    ConfirmationRequired { action: String },

    // ── Configuration / IO ───────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(code(velo::config))]
    Config(Box<figment::Error>),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::ConfirmationRequired { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Transport / core error mapping ───────────────────────────────────

/// Translate a transport-layer failure, tagging it with the server URL the
/// request was aimed at.
pub fn api_error(err: velocache_api::Error, url: &url::Url) -> CliError {
    match err {
        velocache_api::Error::Transport(e) if e.is_timeout() => CliError::Timeout {
            source: Box::new(e),
        },
        velocache_api::Error::Transport(e) => CliError::ConnectionFailed {
            url: url.to_string(),
            source: Box::new(e),
        },
        velocache_api::Error::Api { status, message } => CliError::Api { status, message },
        velocache_api::Error::Deserialization { message, .. } => {
            CliError::BadResponse { message }
        }
        velocache_api::Error::InvalidUrl(e) => CliError::Validation {
            field: "server".into(),
            reason: e.to_string(),
        },
        velocache_api::Error::StreamConnect(message) => CliError::ConnectionFailed {
            url: url.to_string(),
            source: message.into(),
        },
    }
}

pub fn core_error(err: CoreError, url: &url::Url) -> CliError {
    match err {
        CoreError::Api(e) => api_error(e, url),
    }
}
