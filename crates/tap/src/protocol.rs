//! Subscription wire protocol
//!
//! WebSocket text frames carrying JSON objects with an `event` name and a
//! `data` payload:
//!
//! ```text
//! client → server   {"event":"subscribe","data":"logs:acme"}
//! server → client   {"event":"message","data":"Joined logs:acme\n"}
//! server → client   {"event":"message","data":"Build started"}
//! server → client   {"event":"error","data":"invalid channel name ..."}
//! ```

use serde::{Deserialize, Serialize};

use shipyard_protocol::ChannelName;

use crate::error::{Result, TapError};

/// Frames a client may send
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum ClientFrame {
    /// Join a channel
    Subscribe(String),
}

impl ClientFrame {
    /// Parse a text frame
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| TapError::Protocol(e.to_string()))
    }
}

/// Frames the server sends
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum ServerFrame {
    /// A channel message (log line or join acknowledgement)
    Message(String),
    /// Request could not be served
    Error(String),
}

impl ServerFrame {
    /// Encode as a JSON text frame
    pub fn to_json(&self) -> String {
        // Two string-only variants; serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Acknowledgement delivered once a connection has joined a channel
pub fn join_ack(channel: &ChannelName) -> String {
    format!("Joined {channel}\n")
}

#[cfg(test)]
#[path = "protocol_test.rs"]
mod tests;
