//! ClickHouse sink metrics
//!
//! Atomic counters for tracking sink performance and health.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::SinkMetricsSnapshot;

/// Metrics for ClickHouse sink
#[derive(Debug, Default)]
pub struct ClickHouseMetrics {
    /// Rows acknowledged by ClickHouse
    pub events_written: AtomicU64,

    /// Inserts that failed after all retries
    pub write_errors: AtomicU64,

    /// Retry attempts
    pub retry_count: AtomicU64,

    /// Transcript reads served
    pub transcript_queries: AtomicU64,
}

impl ClickHouseMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            events_written: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
            retry_count: AtomicU64::new(0),
            transcript_queries: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_written(&self) {
        self.events_written.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_retry(&self) {
        self.retry_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_transcript_query(&self) {
        self.transcript_queries.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of metrics
    pub fn snapshot(&self) -> SinkMetricsSnapshot {
        SinkMetricsSnapshot {
            events_written: self.events_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            retry_count: self.retry_count.load(Ordering::Relaxed),
            transcript_queries: self.transcript_queries.load(Ordering::Relaxed),
        }
    }
}
