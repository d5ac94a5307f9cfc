//! Core error type.

use thiserror::Error;

/// Errors surfaced by the sync core.
///
/// Transport and decode failures inside the background tasks never show up
/// here; they are logged and retried. This type covers the calls a consumer
/// makes directly, which are mostly command round trips.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A command-client call failed.
    #[error(transparent)]
    Api(#[from] velocache_api::Error),
}
