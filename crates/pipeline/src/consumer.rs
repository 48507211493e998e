//! Ingest consumer - dispatcher and partition workers
//!
//! ```text
//!                     ┌──→ [worker p0] ──→ write ──→ commit
//!  Transport.poll ──→ ├──→ [worker p1] ──→ write ──→ commit
//!    (dispatcher)     └──→ [worker p2] ──→ write ──→ commit
//!                                  └──→ FanoutHandle (never blocks)
//! ```
//!
//! One worker task per `(topic, partition)` processes batches strictly in
//! arrival order, so offsets of a partition are written and committed in
//! order while different partitions progress independently.
//!
//! The queue to each worker is bounded. The dispatcher never waits on it:
//! when a worker's queue is full the batch is parked and the partition is
//! paused at the transport, then resumed once the parked batches have been
//! handed over. The transport keeps being polled the whole time, so a slow
//! store never stalls the consumer's group membership.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::metrics::IngestMetrics;
use crate::processor::{BatchProcessor, ProcessorContext};
use crate::transport::{MessageBatch, Transport};

/// Default bound on batches queued per partition
pub const DEFAULT_PARTITION_QUEUE_SIZE: usize = 4;

/// Default bound on waiting for workers during shutdown
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Pause after a failed poll
const POLL_ERROR_BACKOFF: Duration = Duration::from_millis(500);

type PartitionKey = (String, i32);

struct PartitionWorker {
    sender: mpsc::Sender<MessageBatch>,
    task: JoinHandle<()>,
    /// Batches read while the queue was full, oldest first
    parked: VecDeque<MessageBatch>,
    paused: bool,
}

/// Reads the transport and drives one worker per partition
pub struct IngestConsumer<T> {
    transport: Arc<T>,
    context: ProcessorContext,
    partition_queue_size: usize,
    shutdown_timeout: Duration,
    workers: HashMap<PartitionKey, PartitionWorker>,
}

impl<T: Transport + 'static> IngestConsumer<T> {
    pub fn new(transport: Arc<T>, context: ProcessorContext) -> Self {
        Self {
            transport,
            context,
            partition_queue_size: DEFAULT_PARTITION_QUEUE_SIZE,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            workers: HashMap::new(),
        }
    }

    pub fn with_partition_queue_size(mut self, size: usize) -> Self {
        self.partition_queue_size = size.max(1);
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Shared ingest counters
    pub fn metrics(&self) -> Arc<IngestMetrics> {
        Arc::clone(&self.context.metrics)
    }

    /// Consume until cancelled or the transport closes
    ///
    /// On cancellation each worker finishes the batch it is processing,
    /// including its final commit, then the transport is closed.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<()> {
        info!("ingest consumer started");

        loop {
            let polled = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                polled = self.transport.poll() => polled,
            };

            match polled {
                Ok(batches) => {
                    for batch in batches {
                        self.dispatch(batch, &cancel);
                    }
                }
                Err(TransportError::Closed) => {
                    info!("transport closed, stopping consumer");
                    break;
                }
                Err(e) => {
                    self.context.metrics.record_poll_error();
                    warn!(error = %e, "transport poll failed");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(POLL_ERROR_BACKOFF) => {}
                    }
                }
            }

            self.release_parked(&cancel);
        }

        self.shutdown(&cancel).await;
        self.transport.close().await?;
        info!("ingest consumer stopped");
        Ok(())
    }

    /// Hand a batch to its partition worker without waiting
    ///
    /// A batch that does not fit is parked behind any earlier parked batches
    /// of the partition, and the partition is paused.
    fn dispatch(&mut self, batch: MessageBatch, cancel: &CancellationToken) {
        if batch.is_empty() {
            return;
        }

        let key = (batch.topic.clone(), batch.partition);
        let worker = self.worker(&key, cancel);
        if !worker.parked.is_empty() {
            worker.parked.push_back(batch);
            return;
        }

        match worker.sender.try_send(batch) {
            Ok(()) => {}
            Err(TrySendError::Full(batch)) => self.park(&key, batch),
            Err(TrySendError::Closed(batch)) => {
                // At most one retry: a worker that exited is replaced once
                warn!(topic = %key.0, partition = key.1, "partition worker exited, restarting");
                self.workers.remove(&key);
                match self.worker(&key, cancel).sender.try_send(batch) {
                    Ok(()) => {}
                    Err(TrySendError::Full(batch)) => self.park(&key, batch),
                    Err(TrySendError::Closed(batch)) => warn!(
                        topic = %key.0,
                        partition = key.1,
                        messages = batch.len(),
                        "dropping batch, partition worker unavailable"
                    ),
                }
            }
        }
    }

    fn park(&mut self, key: &PartitionKey, batch: MessageBatch) {
        let Some(worker) = self.workers.get_mut(key) else {
            return;
        };
        worker.parked.push_back(batch);

        if !worker.paused {
            match self.transport.pause(&key.0, key.1) {
                Ok(()) => {
                    worker.paused = true;
                    debug!(topic = %key.0, partition = key.1, "partition paused, worker queue full");
                }
                Err(e) => warn!(topic = %key.0, partition = key.1, error = %e, "failed to pause partition"),
            }
        }
    }

    /// Move parked batches into worker queues that have room again, resuming
    /// partitions whose backlog is gone
    fn release_parked(&mut self, cancel: &CancellationToken) {
        let mut restart = Vec::new();

        for (key, worker) in self.workers.iter_mut() {
            while let Some(batch) = worker.parked.pop_front() {
                match worker.sender.try_send(batch) {
                    Ok(()) => {}
                    Err(TrySendError::Full(batch)) => {
                        worker.parked.push_front(batch);
                        break;
                    }
                    Err(TrySendError::Closed(batch)) => {
                        worker.parked.push_front(batch);
                        restart.push(key.clone());
                        break;
                    }
                }
            }

            if worker.parked.is_empty() && worker.paused {
                match self.transport.resume(&key.0, key.1) {
                    Ok(()) => {
                        worker.paused = false;
                        debug!(topic = %key.0, partition = key.1, "partition resumed");
                    }
                    Err(e) => warn!(topic = %key.0, partition = key.1, error = %e, "failed to resume partition"),
                }
            }
        }

        for key in restart {
            let Some(dead) = self.workers.remove(&key) else {
                continue;
            };
            warn!(topic = %key.0, partition = key.1, "partition worker exited, restarting");
            let worker = self.worker(&key, cancel);
            worker.parked = dead.parked;
            worker.paused = dead.paused;
        }
    }

    fn worker(&mut self, key: &PartitionKey, cancel: &CancellationToken) -> &mut PartitionWorker {
        let transport = &self.transport;
        let context = &self.context;
        let queue_size = self.partition_queue_size;

        self.workers.entry(key.clone()).or_insert_with(|| {
            let (sender, receiver) = mpsc::channel(queue_size);
            debug!(topic = %key.0, partition = key.1, "starting partition worker");
            let task = tokio::spawn(run_worker(
                Arc::clone(transport),
                BatchProcessor::new(context.clone()),
                receiver,
                cancel.clone(),
            ));
            PartitionWorker {
                sender,
                task,
                parked: VecDeque::new(),
                paused: false,
            }
        })
    }

    /// Close the worker queues and wait for in-flight batches
    async fn shutdown(&mut self, cancel: &CancellationToken) {
        cancel.cancel();

        let workers: Vec<_> = self.workers.drain().collect();
        for ((topic, partition), worker) in workers {
            if !worker.parked.is_empty() {
                // Uncommitted, so they are read again after restart
                debug!(%topic, partition, batches = worker.parked.len(), "discarding parked batches");
            }
            drop(worker.sender);
            match tokio::time::timeout(self.shutdown_timeout, worker.task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(%topic, partition, error = %e, "partition worker panicked"),
                Err(_) => warn!(
                    %topic,
                    partition,
                    timeout_secs = self.shutdown_timeout.as_secs(),
                    "partition worker did not stop in time"
                ),
            }
        }
    }
}

async fn run_worker<T: Transport>(
    transport: Arc<T>,
    mut processor: BatchProcessor,
    mut receiver: mpsc::Receiver<MessageBatch>,
    cancel: CancellationToken,
) {
    loop {
        let batch = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            batch = receiver.recv() => match batch {
                Some(batch) => batch,
                None => break,
            },
        };

        let report = processor
            .process_batch(&batch, transport.as_ref(), transport.as_ref())
            .await;

        debug!(
            topic = %report.topic,
            partition = report.partition,
            messages = report.outcomes.len(),
            written = report.written(),
            failed = report.failed(),
            committed = ?report.committed,
            revoked = report.revoked,
            "batch processed"
        );
    }
}

#[cfg(test)]
#[path = "consumer_test.rs"]
mod tests;
