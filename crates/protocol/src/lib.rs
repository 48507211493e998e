//! Shipyard Protocol - core types shared by the ingestion pipeline
//!
//! This crate provides the types that flow between crates:
//! - `LogEvent` - one log line from a build job, decoded from the transport
//! - `ChannelName` - the real-time channel a project's log lines go to
//!
//! Decoding never panics on producer input. Anything that is not a JSON
//! object with a non-empty `DEPLOYMENT_ID` and a string `log` is reported as a
//! `ProtocolError` so the consumer can skip it and move on.

mod channel;
mod error;
mod event;

pub use channel::{ChannelName, LOG_CHANNEL_PREFIX, MAX_CHANNEL_NAME_LEN};
pub use error::ProtocolError;
pub use event::{FIELD_DEPLOYMENT_ID, FIELD_LOG, LogEvent};

// Re-export bytes for convenience
pub use bytes::Bytes;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

// Test modules - only compiled during testing
#[cfg(test)]
mod channel_test;
