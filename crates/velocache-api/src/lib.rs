// velocache-api: Async Rust client for the VeloCache management API
// (REST command surface + WebSocket event stream)

pub mod client;
pub mod error;
pub mod events;
pub mod models;
pub mod stream;
pub mod transport;

pub use client::ManagementClient;
pub use error::Error;
pub use events::PushEvent;
pub use stream::{EventStream, StreamConfig, StreamState, StreamUpdate};
