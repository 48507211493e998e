//! Shipyard Tap - live log channels for viewers
//!
//! This crate provides the real-time side of log fan-out:
//!
//! - `ChannelHub` tracks connections and their channel memberships
//! - Publishing is fire-and-forget; a slow viewer misses messages instead of
//!   slowing the pipeline
//! - `GatewayServer` speaks a small JSON protocol over WebSocket
//!
//! # Architecture
//!
//! ```text
//! FanoutPublisher
//!     │
//!     │ publish("logs:acme", line)
//!     ▼
//! ChannelHub ──── per-connection bounded queues
//!     │
//!     ▼
//! GatewayServer (GET /ws)
//!     │
//!     └──→ browsers / CLI viewers
//! ```

pub mod connection;
mod error;
pub mod gateway;
pub mod hub;
pub mod protocol;

pub use connection::Connection;
pub use error::{Result, TapError};
pub use gateway::{GatewayServer, GatewayServerConfig, WS_PATH, handle_text_frame};
pub use hub::{ChannelHub, ChannelPublisher, HubConfig, HubStats};
pub use protocol::{ClientFrame, ServerFrame, join_ack};
