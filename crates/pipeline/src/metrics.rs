//! Pipeline metrics
//!
//! Atomic counters for ingestion and fan-out.
//! All operations use relaxed ordering; values are eventually consistent.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// =============================================================================
// Ingest Metrics
// =============================================================================

/// Counters for the consume → write → commit path
#[derive(Debug, Default)]
pub struct IngestMetrics {
    /// Batches handed to partition workers
    batches_received: AtomicU64,
    /// Messages handed to partition workers
    messages_received: AtomicU64,
    /// Events durably written
    events_written: AtomicU64,
    /// Durable writes that failed
    write_failures: AtomicU64,
    /// Messages skipped as malformed
    malformed: AtomicU64,
    /// Messages dropped because their partition was revoked
    abandoned: AtomicU64,
    /// Offset commits acknowledged
    commits: AtomicU64,
    /// Offset commits rejected
    commit_failures: AtomicU64,
    /// Partition revocations observed
    revocations: AtomicU64,
    /// Transport poll errors
    poll_errors: AtomicU64,
}

impl IngestMetrics {
    /// Create new metrics instance with all counters at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            batches_received: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            events_written: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            malformed: AtomicU64::new(0),
            abandoned: AtomicU64::new(0),
            commits: AtomicU64::new(0),
            commit_failures: AtomicU64::new(0),
            revocations: AtomicU64::new(0),
            poll_errors: AtomicU64::new(0),
        }
    }

    /// Record a batch dispatched to a partition worker
    #[inline]
    pub fn record_batch(&self, message_count: u64) {
        self.batches_received.fetch_add(1, Ordering::Relaxed);
        self.messages_received
            .fetch_add(message_count, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_written(&self) {
        self.events_written.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_abandoned(&self, count: u64) {
        self.abandoned.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_commit(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_commit_failure(&self) {
        self.commit_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_revocation(&self) {
        self.revocations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_poll_error(&self) {
        self.poll_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> IngestSnapshot {
        IngestSnapshot {
            batches_received: self.batches_received.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            events_written: self.events_written.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            commit_failures: self.commit_failures.load(Ordering::Relaxed),
            revocations: self.revocations.load(Ordering::Relaxed),
            poll_errors: self.poll_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of ingest metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct IngestSnapshot {
    pub batches_received: u64,
    pub messages_received: u64,
    pub events_written: u64,
    pub write_failures: u64,
    pub malformed: u64,
    pub abandoned: u64,
    pub commits: u64,
    pub commit_failures: u64,
    pub revocations: u64,
    pub poll_errors: u64,
}

impl IngestSnapshot {
    /// Calculate the difference from another snapshot
    ///
    /// Useful for per-interval rates in the periodic metrics log.
    pub fn diff(&self, previous: &IngestSnapshot) -> IngestSnapshot {
        IngestSnapshot {
            batches_received: self.batches_received.saturating_sub(previous.batches_received),
            messages_received: self
                .messages_received
                .saturating_sub(previous.messages_received),
            events_written: self.events_written.saturating_sub(previous.events_written),
            write_failures: self.write_failures.saturating_sub(previous.write_failures),
            malformed: self.malformed.saturating_sub(previous.malformed),
            abandoned: self.abandoned.saturating_sub(previous.abandoned),
            commits: self.commits.saturating_sub(previous.commits),
            commit_failures: self.commit_failures.saturating_sub(previous.commit_failures),
            revocations: self.revocations.saturating_sub(previous.revocations),
            poll_errors: self.poll_errors.saturating_sub(previous.poll_errors),
        }
    }
}

// =============================================================================
// Fan-out Metrics
// =============================================================================

/// Counters for the lookup → publish path
#[derive(Debug, Default)]
pub struct FanoutMetrics {
    /// Events accepted into the fan-out queue
    submitted: AtomicU64,
    /// Events dropped because the queue was full
    queue_full: AtomicU64,
    /// Events published to a channel
    published: AtomicU64,
    /// Connections that received a published line
    deliveries: AtomicU64,
    /// Deployments with no owning project
    unresolved: AtomicU64,
    /// Lookups that errored
    lookup_failures: AtomicU64,
    /// Lookups that exceeded the timeout
    lookup_timeouts: AtomicU64,
}

impl FanoutMetrics {
    #[inline]
    pub const fn new() -> Self {
        Self {
            submitted: AtomicU64::new(0),
            queue_full: AtomicU64::new(0),
            published: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
            unresolved: AtomicU64::new(0),
            lookup_failures: AtomicU64::new(0),
            lookup_timeouts: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_queue_full(&self) {
        self.queue_full.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_published(&self, deliveries: usize) {
        self.published.fetch_add(1, Ordering::Relaxed);
        self.deliveries
            .fetch_add(deliveries as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_unresolved(&self) {
        self.unresolved.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_lookup_failure(&self) {
        self.lookup_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_lookup_timeout(&self) {
        self.lookup_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> FanoutSnapshot {
        FanoutSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            queue_full: self.queue_full.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            unresolved: self.unresolved.load(Ordering::Relaxed),
            lookup_failures: self.lookup_failures.load(Ordering::Relaxed),
            lookup_timeouts: self.lookup_timeouts.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of fan-out metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FanoutSnapshot {
    pub submitted: u64,
    pub queue_full: u64,
    pub published: u64,
    pub deliveries: u64,
    pub unresolved: u64,
    pub lookup_failures: u64,
    pub lookup_timeouts: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_snapshot() {
        let metrics = IngestMetrics::new();
        metrics.record_batch(3);
        metrics.record_written();
        metrics.record_written();
        metrics.record_malformed();
        metrics.record_commit();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.batches_received, 1);
        assert_eq!(snapshot.messages_received, 3);
        assert_eq!(snapshot.events_written, 2);
        assert_eq!(snapshot.malformed, 1);
        assert_eq!(snapshot.commits, 1);
        assert_eq!(snapshot.write_failures, 0);
    }

    #[test]
    fn test_ingest_diff() {
        let metrics = IngestMetrics::new();
        metrics.record_written();
        let before = metrics.snapshot();

        metrics.record_written();
        metrics.record_written();
        let diff = metrics.snapshot().diff(&before);

        assert_eq!(diff.events_written, 2);
        assert_eq!(diff.commits, 0);
    }

    #[test]
    fn test_fanout_snapshot() {
        let metrics = FanoutMetrics::new();
        metrics.record_submitted();
        metrics.record_published(3);
        metrics.record_unresolved();
        metrics.record_queue_full();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.submitted, 1);
        assert_eq!(snapshot.published, 1);
        assert_eq!(snapshot.deliveries, 3);
        assert_eq!(snapshot.unresolved, 1);
        assert_eq!(snapshot.queue_full, 1);
    }
}
