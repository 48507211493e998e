//! Error types for the tap crate

use std::io;
use thiserror::Error;

use shipyard_protocol::ProtocolError;

/// Errors that can occur in the channel hub and gateway
#[derive(Error, Debug)]
pub enum TapError {
    /// I/O error (listener bind, accept)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed client frame
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Invalid channel name in a subscribe request
    #[error(transparent)]
    InvalidChannel(#[from] ProtocolError),

    /// Maximum connections reached
    #[error("maximum connections reached ({max})")]
    MaxConnections { max: usize },

    /// The connection's queue had no room for the join acknowledgement
    #[error("connection {id} is not keeping up, subscription to {channel} refused")]
    QueueFull { id: u64, channel: String },

    /// Connection not found
    #[error("connection not found: {id}")]
    ConnectionNotFound { id: u64 },
}

/// Result type for tap operations
pub type Result<T> = std::result::Result<T, TapError>;
