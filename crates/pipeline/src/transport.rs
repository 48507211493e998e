//! Transport capabilities
//!
//! The pipeline sees the append log through three narrow capabilities so the
//! batch logic runs the same against Kafka and the in-memory log:
//!
//! | Capability | Used by | Purpose |
//! |------------|---------|---------|
//! | [`BatchSource`] | dispatcher | pull per-partition batches in offset order, pause a lagging partition |
//! | [`OffsetCommitter`] | partition workers | commit the next offset to read |
//! | [`Heartbeat`] | partition workers | confirm the assignment is still held |
//!
//! Committed offsets follow Kafka semantics: committing `n` means every
//! message below `n` is settled and a restarted consumer resumes at `n`.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TransportError;

/// One message read from a partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportMessage {
    pub offset: i64,
    pub key: Option<Bytes>,
    /// `None` for tombstones
    pub payload: Option<Bytes>,
}

impl TransportMessage {
    pub fn new(offset: i64, payload: impl Into<Bytes>) -> Self {
        Self {
            offset,
            key: None,
            payload: Some(payload.into()),
        }
    }
}

/// Consecutive messages of a single partition, in offset order
#[derive(Debug, Clone)]
pub struct MessageBatch {
    pub topic: String,
    pub partition: i32,
    /// Assignment epoch the messages were read under
    pub generation: u64,
    pub messages: Vec<TransportMessage>,
}

impl MessageBatch {
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Offset of the last message
    pub fn last_offset(&self) -> Option<i64> {
        self.messages.last().map(|m| m.offset)
    }
}

/// Pulls messages from the transport
#[async_trait]
pub trait BatchSource: Send + Sync {
    /// Wait for the next messages, grouped into one batch per partition
    ///
    /// May return an empty list when nothing arrived within the linger time.
    async fn poll(&self) -> Result<Vec<MessageBatch>, TransportError>;

    /// Stop fetching `partition` until [`BatchSource::resume`] is called
    ///
    /// Polling continues for the other partitions, which keeps the consumer
    /// in its group while one partition's worker is behind.
    fn pause(&self, _topic: &str, _partition: i32) -> Result<(), TransportError> {
        Ok(())
    }

    /// Fetch a paused partition again
    fn resume(&self, _topic: &str, _partition: i32) -> Result<(), TransportError> {
        Ok(())
    }

    /// Leave the consumer group
    async fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Commits consumer progress
#[async_trait]
pub trait OffsetCommitter: Send + Sync {
    /// Record that every message of `partition` below `next_offset` is settled
    async fn commit(&self, topic: &str, partition: i32, next_offset: i64)
    -> Result<(), TransportError>;
}

/// Keeps the partition assignment alive
#[async_trait]
pub trait Heartbeat: Send + Sync {
    /// Signal liveness for a partition read under `generation`
    ///
    /// Fails with [`TransportError::PartitionRevoked`] once the partition has
    /// been reassigned.
    async fn heartbeat(&self, topic: &str, partition: i32, generation: u64)
    -> Result<(), TransportError>;
}

/// All three capabilities, as provided by a full transport
pub trait Transport: BatchSource + OffsetCommitter + Heartbeat {}

impl<T: BatchSource + OffsetCommitter + Heartbeat> Transport for T {}
