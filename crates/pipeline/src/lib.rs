//! Shipyard - Ingestion Pipeline
//!
//! Consumes build log events from the append log, stores each one durably,
//! commits progress per partition and publishes live copies to viewers.
//!
//! # Architecture
//!
//! ```text
//! [Transport]            [Partition workers]                 [Outputs]
//!  Kafka ──┐                                          ┌──→ LogSink (durable)
//!  Memory ─┴──→ IngestConsumer ──→ BatchProcessor ────┤
//!               (dispatcher)       decode/write/commit └──→ FanoutHandle ──→ logs:<key>
//! ```
//!
//! # Key Design
//!
//! - **Store before commit**: an offset is committed only once every message
//!   below it is durably written or skipped as malformed
//! - **Per-partition order**: one worker per partition, bounded queues
//! - **Detached fan-out**: live publishing never blocks or fails ingestion
//! - **Narrow transport seams**: [`BatchSource`], [`OffsetCommitter`] and
//!   [`Heartbeat`] let the same logic run on Kafka and in memory
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use shipyard_pipeline::{IngestConsumer, MemoryTransport, ProcessorContext};
//! use shipyard_sinks::memory::MemoryLogStore;
//! use tokio_util::sync::CancellationToken;
//!
//! let transport = Arc::new(MemoryTransport::new("container-logs"));
//! let consumer = IngestConsumer::new(transport, ProcessorContext::new(Arc::new(MemoryLogStore::new())));
//! tokio::spawn(consumer.run(CancellationToken::new()));
//! ```

mod commit;
mod consumer;
mod error;
mod fanout;
mod kafka;
mod memory;
mod metrics;
mod processor;
mod transport;

pub use commit::{CommitCoordinator, Settlement};
pub use consumer::{DEFAULT_PARTITION_QUEUE_SIZE, DEFAULT_SHUTDOWN_TIMEOUT, IngestConsumer};
pub use error::{PipelineError, Result, TransportError};
pub use fanout::{DEFAULT_LOOKUP_TIMEOUT, FanoutHandle, FanoutPublisher};
pub use kafka::{KafkaBatchReader, client_config};
pub use memory::{DEFAULT_MEMORY_LINGER, MemoryTransport};
pub use metrics::{FanoutMetrics, FanoutSnapshot, IngestMetrics, IngestSnapshot};
pub use processor::{
    BatchProcessor, BatchReport, DEFAULT_COMMIT_EVERY, DEFAULT_HEARTBEAT_INTERVAL, MessageOutcome,
    ProcessorContext,
};
pub use transport::{
    BatchSource, Heartbeat, MessageBatch, OffsetCommitter, Transport, TransportMessage,
};

/// Default bound on events queued for live publishing
pub const DEFAULT_FANOUT_QUEUE_SIZE: usize = 10_000;
