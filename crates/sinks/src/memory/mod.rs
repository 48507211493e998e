//! Memory sink - in-process durable store stand-in
//!
//! Keeps every written event in a `Vec`, assigns strictly increasing
//! millisecond timestamps, and serves transcripts like the ClickHouse sink.
//!
//! # Use Cases
//!
//! - **Testing**: pipeline tests inject failures with [`MemoryLogStore::fail_next`]
//! - **Development**: run the service without a ClickHouse server
//!
//! Contents are lost when the process exits.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use shipyard_protocol::LogEvent;

use crate::{
    LogSink, Result, SinkError, SinkMetricsSnapshot, StoredLogEvent, TranscriptReader,
    new_event_id,
};

/// In-memory log store
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    events: RwLock<Vec<StoredLogEvent>>,
    /// 0 = unbounded
    max_events: usize,
    /// Artificial latency per write
    write_delay: Option<Duration>,
    /// Remaining writes to fail
    fail_next: AtomicUsize,
    /// Fail every write until cleared
    unavailable: AtomicBool,
    closed: AtomicBool,
    written: AtomicU64,
    errors: AtomicU64,
    queries: AtomicU64,
}

impl MemoryLogStore {
    /// Create an unbounded store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that refuses writes beyond `max_events`
    pub fn with_capacity_limit(max_events: usize) -> Self {
        Self {
            max_events,
            ..Self::default()
        }
    }

    /// Delay every write, simulating a slow store
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    /// Fail the next `count` writes
    pub fn fail_next(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Fail every write while `unavailable` is true
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored events
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// All stored events in insertion order
    pub fn events(&self) -> Vec<StoredLogEvent> {
        self.events.read().clone()
    }

    /// How many copies of a given line were stored for a deployment
    pub fn count_matching(&self, deployment_id: &str, log: &str) -> usize {
        self.events
            .read()
            .iter()
            .filter(|e| e.deployment_id == deployment_id && e.log == log)
            .count()
    }

    /// Consume one injected failure, if any
    fn take_injected_failure(&self) -> bool {
        if self.unavailable.load(Ordering::SeqCst) {
            return true;
        }
        self.fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[async_trait]
impl LogSink for MemoryLogStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn write(&self, event: &LogEvent) -> Result<Uuid> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SinkError::Closed);
        }

        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }

        if self.take_injected_failure() {
            self.errors.fetch_add(1, Ordering::Relaxed);
            return Err(SinkError::Unavailable("injected write failure".into()));
        }

        let event_id = new_event_id();
        {
            let mut events = self.events.write();
            if self.max_events > 0 && events.len() >= self.max_events {
                self.errors.fetch_add(1, Ordering::Relaxed);
                return Err(SinkError::Full {
                    max: self.max_events,
                });
            }

            // Strictly increasing so transcript order equals write order
            let timestamp = events
                .last()
                .map(|last| now_millis().max(last.timestamp + 1))
                .unwrap_or_else(now_millis);

            events.push(StoredLogEvent {
                event_id,
                deployment_id: event.deployment_id.clone(),
                log: event.log_line.clone(),
                timestamp,
            });
        }

        self.written.fetch_add(1, Ordering::Relaxed);
        debug!(%event_id, deployment_id = %event.deployment_id, "log event stored in memory");
        Ok(event_id)
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn metrics_snapshot(&self) -> SinkMetricsSnapshot {
        SinkMetricsSnapshot {
            events_written: self.written.load(Ordering::Relaxed),
            write_errors: self.errors.load(Ordering::Relaxed),
            retry_count: 0,
            transcript_queries: self.queries.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl TranscriptReader for MemoryLogStore {
    async fn transcript(&self, deployment_id: &str) -> Result<Vec<StoredLogEvent>> {
        self.queries.fetch_add(1, Ordering::Relaxed);

        let mut events: Vec<_> = self
            .events
            .read()
            .iter()
            .filter(|e| e.deployment_id == deployment_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }
}
