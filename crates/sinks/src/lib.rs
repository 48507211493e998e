//! Shipyard Sinks - durable log event stores
//!
//! Every ingested log event is written once to a durable store with a fresh
//! `event_id`. The pipeline only commits transport offsets after
//! [`LogSink::write`] returns `Ok`, so a store must not acknowledge a write
//! before the row is persisted.
//!
//! # Available Sinks
//!
//! | Sink | Purpose |
//! |------|---------|
//! | `clickhouse` | Production store, one row per event in `log_events` |
//! | `memory` | In-process store for tests and local runs |
//!
//! The same stores serve the read path: [`TranscriptReader::transcript`]
//! returns every stored event of a deployment in timestamp order.

pub mod clickhouse;
mod error;
pub mod memory;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use shipyard_protocol::LogEvent;

pub use error::SinkError;

/// Result type for sink operations
pub type Result<T> = std::result::Result<T, SinkError>;

/// A log event as persisted by a durable store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredLogEvent {
    /// Unique id generated for this write
    pub event_id: Uuid,
    /// Deployment the line belongs to
    pub deployment_id: String,
    /// Raw log line
    pub log: String,
    /// Store-assigned insert time, milliseconds since the Unix epoch
    pub timestamp: i64,
}

/// Counters common to every durable store
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SinkMetricsSnapshot {
    pub events_written: u64,
    pub write_errors: u64,
    pub retry_count: u64,
    pub transcript_queries: u64,
}

/// Write side of a durable store
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Sink type name for logs and metrics
    fn name(&self) -> &str;

    /// Persist one event, returning the generated event id
    ///
    /// `Ok` means the row is durable. Any error means it may not be, and the
    /// caller must not commit the corresponding transport offset.
    async fn write(&self, event: &LogEvent) -> Result<Uuid>;

    /// Release client resources; further writes fail with [`SinkError::Closed`]
    async fn close(&self) -> Result<()> {
        Ok(())
    }

    /// Point-in-time counters
    fn metrics_snapshot(&self) -> SinkMetricsSnapshot;
}

/// Read side of a durable store
#[async_trait]
pub trait TranscriptReader: Send + Sync {
    /// All stored events for a deployment, oldest first
    async fn transcript(&self, deployment_id: &str) -> Result<Vec<StoredLogEvent>>;
}

/// Generate a fresh event id
#[inline]
pub(crate) fn new_event_id() -> Uuid {
    Uuid::new_v4()
}
