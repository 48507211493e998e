//! Protocol error types
//!
//! Errors that can occur when decoding log events or naming channels.

use thiserror::Error;

/// Errors that can occur during protocol operations
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Transport delivered a message with no value (tombstone)
    #[error("message has no payload")]
    NullPayload,

    /// Payload is not a JSON object of the expected shape
    #[error("invalid json payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Required field present but empty
    #[error("field must not be empty: {0}")]
    EmptyField(&'static str),

    /// Channel name rejected
    #[error("invalid channel name '{name}': {reason}")]
    InvalidChannel { name: String, reason: &'static str },
}

impl ProtocolError {
    /// Create a missing field error
    #[inline]
    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField(field)
    }

    /// Create an invalid channel error
    #[inline]
    pub fn invalid_channel(name: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidChannel {
            name: name.into(),
            reason,
        }
    }
}
