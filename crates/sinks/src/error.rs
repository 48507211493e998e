//! Sink error types

use thiserror::Error;

use crate::clickhouse::ClickHouseSinkError;

/// Errors returned by durable stores
#[derive(Debug, Error)]
pub enum SinkError {
    /// ClickHouse client or server error
    #[error(transparent)]
    ClickHouse(#[from] ClickHouseSinkError),

    /// Store could not accept the write
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Bounded store reached its capacity
    #[error("store is full ({max} events)")]
    Full { max: usize },

    /// Sink was closed
    #[error("sink closed")]
    Closed,
}
