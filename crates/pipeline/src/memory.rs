//! In-memory append log
//!
//! A single-topic, multi-partition log with consumer-group semantics close
//! enough to Kafka for the pipeline to run unchanged against it:
//!
//! - reads resume from the committed offset after [`MemoryTransport::restart`]
//! - [`MemoryTransport::revoke`] reassigns a partition under a new generation
//! - paused partitions are skipped by `poll` until resumed
//! - commits can be made to fail on demand
//!
//! Used by the pipeline tests in place of a broker.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::Notify;

use shipyard_protocol::LogEvent;

use crate::error::TransportError;
use crate::transport::{BatchSource, Heartbeat, MessageBatch, OffsetCommitter, TransportMessage};

/// Default wait for new messages when the log is drained
pub const DEFAULT_MEMORY_LINGER: Duration = Duration::from_millis(10);

#[derive(Debug, Default)]
struct PartitionLog {
    messages: Vec<TransportMessage>,
    /// Next offset handed out by `poll`
    position: i64,
    committed: Option<i64>,
    history: Vec<i64>,
    generation: u64,
}

impl PartitionLog {
    fn rewind(&mut self) {
        self.position = self.committed.unwrap_or(0);
        self.generation += 1;
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    partitions: BTreeMap<i32, PartitionLog>,
    paused: BTreeSet<i32>,
    pause_count: usize,
    fail_commits: usize,
    closed: bool,
}

/// In-memory transport
#[derive(Debug)]
pub struct MemoryTransport {
    topic: String,
    max_batch_size: usize,
    linger: Duration,
    state: Mutex<MemoryState>,
    notify: Notify,
}

impl MemoryTransport {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            max_batch_size: 500,
            linger: DEFAULT_MEMORY_LINGER,
            state: Mutex::new(MemoryState::default()),
            notify: Notify::new(),
        }
    }

    /// Cap the number of messages returned by one poll
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size.max(1);
        self
    }

    pub fn with_linger(mut self, linger: Duration) -> Self {
        self.linger = linger;
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Append a raw payload, returning its offset
    pub fn produce(&self, partition: i32, payload: impl Into<Bytes>) -> i64 {
        let offset = {
            let mut state = self.state.lock();
            let log = state.partitions.entry(partition).or_default();
            let offset = log.messages.len() as i64;
            log.messages.push(TransportMessage::new(offset, payload));
            offset
        };
        self.notify.notify_one();
        offset
    }

    /// Append an encoded log event
    pub fn produce_event(&self, partition: i32, event: &LogEvent) -> i64 {
        self.produce(partition, event.to_payload())
    }

    /// Reassign a partition: reads restart at its committed offset under a
    /// new generation, and the old generation's heartbeats fail
    pub fn revoke(&self, partition: i32) {
        if let Some(log) = self.state.lock().partitions.get_mut(&partition) {
            log.rewind();
        }
        self.notify.notify_one();
    }

    /// Simulate a consumer restart: every partition resumes at its committed
    /// offset and the transport accepts polls again
    pub fn restart(&self) {
        let mut state = self.state.lock();
        state.closed = false;
        state.paused.clear();
        state.partitions.values_mut().for_each(PartitionLog::rewind);
    }

    /// Make the next `count` commits fail
    pub fn fail_commits(&self, count: usize) {
        self.state.lock().fail_commits = count;
    }

    /// Last committed offset of a partition
    pub fn committed(&self, partition: i32) -> Option<i64> {
        self.state
            .lock()
            .partitions
            .get(&partition)
            .and_then(|log| log.committed)
    }

    /// Every accepted commit of a partition, in order
    pub fn commit_history(&self, partition: i32) -> Vec<i64> {
        self.state
            .lock()
            .partitions
            .get(&partition)
            .map(|log| log.history.clone())
            .unwrap_or_default()
    }

    /// Whether `poll` currently skips the partition
    pub fn is_paused(&self, partition: i32) -> bool {
        self.state.lock().paused.contains(&partition)
    }

    /// How many times any partition was paused
    pub fn pause_count(&self) -> usize {
        self.state.lock().pause_count
    }

    /// Number of messages appended to a partition
    pub fn len(&self, partition: i32) -> usize {
        self.state
            .lock()
            .partitions
            .get(&partition)
            .map_or(0, |log| log.messages.len())
    }

    fn take_batches(&self) -> Result<Vec<MessageBatch>, TransportError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }

        let mut budget = self.max_batch_size;
        let mut batches = Vec::new();

        let MemoryState {
            partitions, paused, ..
        } = &mut *state;

        for (&partition, log) in partitions.iter_mut() {
            if budget == 0 {
                break;
            }
            if paused.contains(&partition) {
                continue;
            }
            let start = log.position as usize;
            let end = log.messages.len().min(start + budget);
            if start >= end {
                continue;
            }

            budget -= end - start;
            log.position = end as i64;
            batches.push(MessageBatch {
                topic: self.topic.clone(),
                partition,
                generation: log.generation,
                messages: log.messages[start..end].to_vec(),
            });
        }

        Ok(batches)
    }
}

#[async_trait]
impl BatchSource for MemoryTransport {
    async fn poll(&self) -> Result<Vec<MessageBatch>, TransportError> {
        let batches = self.take_batches()?;
        if !batches.is_empty() {
            return Ok(batches);
        }

        // Nothing buffered: wait for a producer, at most one linger period
        let _ = tokio::time::timeout(self.linger, self.notify.notified()).await;
        self.take_batches()
    }

    fn pause(&self, _topic: &str, partition: i32) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if state.paused.insert(partition) {
            state.pause_count += 1;
        }
        Ok(())
    }

    fn resume(&self, _topic: &str, partition: i32) -> Result<(), TransportError> {
        self.state.lock().paused.remove(&partition);
        self.notify.notify_one();
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.state.lock().closed = true;
        self.notify.notify_waiters();
        Ok(())
    }
}

#[async_trait]
impl OffsetCommitter for MemoryTransport {
    async fn commit(
        &self,
        topic: &str,
        partition: i32,
        next_offset: i64,
    ) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if state.fail_commits > 0 {
            state.fail_commits -= 1;
            return Err(TransportError::commit_failed(topic, partition, "injected commit failure"));
        }

        let log = state
            .partitions
            .get_mut(&partition)
            .ok_or_else(|| TransportError::revoked(topic, partition))?;
        log.history.push(next_offset);
        if log.committed.is_none_or(|c| next_offset > c) {
            log.committed = Some(next_offset);
        }
        Ok(())
    }
}

#[async_trait]
impl Heartbeat for MemoryTransport {
    async fn heartbeat(
        &self,
        topic: &str,
        partition: i32,
        generation: u64,
    ) -> Result<(), TransportError> {
        let state = self.state.lock();
        match state.partitions.get(&partition) {
            Some(log) if log.generation == generation => Ok(()),
            _ => Err(TransportError::revoked(topic, partition)),
        }
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
