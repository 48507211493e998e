//! Pipeline error types

use thiserror::Error;

use shipyard_sinks::SinkError;

/// Transport errors (reading, committing, group membership)
#[derive(Debug, Error)]
pub enum TransportError {
    /// Kafka client error
    #[error("kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    /// The partition was reassigned; its pending work must be abandoned
    #[error("partition {topic}/{partition} revoked")]
    PartitionRevoked { topic: String, partition: i32 },

    /// Offset commit rejected
    #[error("commit failed for {topic}/{partition}: {message}")]
    CommitFailed {
        topic: String,
        partition: i32,
        message: String,
    },

    /// Reader was closed
    #[error("transport closed")]
    Closed,
}

impl TransportError {
    /// Create a partition revoked error
    pub fn revoked(topic: impl Into<String>, partition: i32) -> Self {
        Self::PartitionRevoked {
            topic: topic.into(),
            partition,
        }
    }

    /// Create a commit failed error
    pub fn commit_failed(topic: impl Into<String>, partition: i32, message: impl Into<String>) -> Self {
        Self::CommitFailed {
            topic: topic.into(),
            partition,
            message: message.into(),
        }
    }

    /// Whether this error means the partition is no longer ours
    #[inline]
    pub fn is_revoked(&self) -> bool {
        matches!(self, Self::PartitionRevoked { .. })
    }
}

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Transport failure
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Durable store failure
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// Pipeline is shutting down
    #[error("pipeline is shutting down")]
    ShuttingDown,
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
