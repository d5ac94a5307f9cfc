//! Live state synchronization core for the VeloCache dashboard.
//!
//! Keeps a local mirror of the proxy server's observable state fresh over
//! one shared push-event stream, with REST hydration on startup and after
//! every reconnect, plus a polling fallback for state the stream does not
//! carry. UI consumers read only from the [`StateStore`] and register
//! [`HandlerSet`]s for push notifications.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod monitor;
pub mod store;

pub use config::MonitorConfig;
pub use dispatch::{DispatchRegistry, HandlerSet, Subscription};
pub use error::CoreError;
pub use monitor::Monitor;
pub use store::StateStore;
