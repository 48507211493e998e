//! Batch processor - per-partition decode, write, commit
//!
//! For every message of a batch, in offset order:
//!
//! 1. decode the payload into a [`LogEvent`]; malformed messages are skipped
//! 2. write the event to the durable store, heartbeating while it is in flight
//! 3. on success, hand the event to the fan-out queue
//! 4. settle the offset with the [`CommitCoordinator`] and flush commits
//!    every `commit_every` settled messages and at the end of the batch
//!
//! A failed write is not retried here. It pins the commit watermark so the
//! message is redelivered after a restart or reassignment.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shipyard_protocol::LogEvent;
use shipyard_sinks::LogSink;

use crate::commit::{CommitCoordinator, Settlement};
use crate::fanout::FanoutHandle;
use crate::metrics::IngestMetrics;
use crate::transport::{Heartbeat, MessageBatch, OffsetCommitter, TransportMessage};

/// Default number of settled messages between commits
pub const DEFAULT_COMMIT_EVERY: usize = 100;

/// Default heartbeat interval while a write is in flight
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(3);

/// What happened to one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Durably stored under this event id
    Written(Uuid),
    /// Skipped: payload was not a valid log event
    Malformed,
    /// The durable write failed; the offset stays uncommitted
    WriteFailed,
    /// Not processed: the partition was revoked first
    Abandoned,
}

/// Per-message results of one batch
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub topic: String,
    pub partition: i32,
    /// `(offset, outcome)` in offset order
    pub outcomes: Vec<(i64, MessageOutcome)>,
    /// Highest offset acknowledged by the transport after this batch
    pub committed: Option<i64>,
    /// The partition was revoked while processing
    pub revoked: bool,
}

impl BatchReport {
    fn new(batch: &MessageBatch) -> Self {
        Self {
            topic: batch.topic.clone(),
            partition: batch.partition,
            outcomes: Vec::with_capacity(batch.len()),
            committed: None,
            revoked: false,
        }
    }

    /// Number of messages with the given outcome kind
    pub fn count(&self, matches: impl Fn(&MessageOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| matches(o)).count()
    }

    pub fn written(&self) -> usize {
        self.count(|o| matches!(o, MessageOutcome::Written(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, MessageOutcome::WriteFailed))
    }
}

/// Shared collaborators for every partition
#[derive(Clone)]
pub struct ProcessorContext {
    pub sink: Arc<dyn LogSink>,
    /// `None` disables live fan-out
    pub fanout: Option<FanoutHandle>,
    pub metrics: Arc<IngestMetrics>,
    pub commit_every: usize,
    pub heartbeat_interval: Duration,
}

impl ProcessorContext {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            fanout: None,
            metrics: Arc::new(IngestMetrics::new()),
            commit_every: DEFAULT_COMMIT_EVERY,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }

    pub fn with_fanout(mut self, fanout: FanoutHandle) -> Self {
        self.fanout = Some(fanout);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<IngestMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_commit_every(mut self, commit_every: usize) -> Self {
        self.commit_every = commit_every.max(1);
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }
}

/// Processes the batches of one partition, owning its commit state
pub struct BatchProcessor {
    context: ProcessorContext,
    coordinator: Option<CommitCoordinator>,
}

impl BatchProcessor {
    pub fn new(context: ProcessorContext) -> Self {
        Self {
            context,
            coordinator: None,
        }
    }

    /// Commit state of the current assignment
    pub fn coordinator(&self) -> Option<&CommitCoordinator> {
        self.coordinator.as_ref()
    }

    /// Process one batch end to end
    ///
    /// Never fails: every problem is reflected in the report and the commit
    /// watermark.
    pub async fn process_batch(
        &mut self,
        batch: &MessageBatch,
        committer: &dyn OffsetCommitter,
        heartbeat: &dyn Heartbeat,
    ) -> BatchReport {
        let mut report = BatchReport::new(batch);
        let metrics = Arc::clone(&self.context.metrics);
        metrics.record_batch(batch.len() as u64);

        let commit_every = self.context.commit_every;
        let coordinator = self
            .coordinator
            .get_or_insert_with(|| CommitCoordinator::new(batch.generation, commit_every));
        if coordinator.generation() != batch.generation {
            debug!(
                topic = %batch.topic,
                partition = batch.partition,
                generation = batch.generation,
                "new assignment, resetting commit state"
            );
            coordinator.reset(batch.generation);
        }

        // Confirm ownership before doing any work
        if let Err(e) = heartbeat
            .heartbeat(&batch.topic, batch.partition, batch.generation)
            .await
        {
            if e.is_revoked() {
                Self::mark_revoked(&mut report, &metrics);
                Self::abandon(&mut report, &batch.messages, &metrics);
                return report;
            }
            warn!(topic = %batch.topic, partition = batch.partition, error = %e, "heartbeat failed");
        }

        let mut ticker = tokio::time::interval(self.context.heartbeat_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        for (index, message) in batch.messages.iter().enumerate() {
            if report.revoked {
                Self::abandon(&mut report, &batch.messages[index..], &metrics);
                break;
            }

            let outcome = match LogEvent::from_payload(message.payload.as_deref()) {
                Err(e) => {
                    metrics.record_malformed();
                    warn!(
                        topic = %batch.topic,
                        partition = batch.partition,
                        offset = message.offset,
                        error = %e,
                        "skipping malformed log message"
                    );
                    MessageOutcome::Malformed
                }
                Ok(event) => {
                    let outcome = self
                        .write_with_heartbeat(batch, message, &event, heartbeat, &mut ticker, &mut report)
                        .await;
                    if let (MessageOutcome::Written(_), Some(fanout)) = (outcome, &self.context.fanout) {
                        fanout.submit(&event);
                    }
                    outcome
                }
            };

            report.outcomes.push((message.offset, outcome));

            let coordinator = self.coordinator_mut(batch.generation);
            coordinator.settle(
                message.offset,
                match outcome {
                    MessageOutcome::WriteFailed => Settlement::Hold,
                    _ => Settlement::Advance,
                },
            );

            if coordinator.should_flush() && !report.revoked {
                self.flush(batch, committer, &mut report).await;
            }
        }

        if !report.revoked {
            self.flush(batch, committer, &mut report).await;
        }

        report.committed = self.coordinator.as_ref().and_then(|c| c.committed());
        report
    }

    /// Durable write, sending heartbeats while it is in flight
    async fn write_with_heartbeat(
        &self,
        batch: &MessageBatch,
        message: &TransportMessage,
        event: &LogEvent,
        heartbeat: &dyn Heartbeat,
        ticker: &mut tokio::time::Interval,
        report: &mut BatchReport,
    ) -> MessageOutcome {
        let write = self.context.sink.write(event);
        tokio::pin!(write);

        let result = loop {
            tokio::select! {
                result = &mut write => break result,
                _ = ticker.tick() => {
                    if let Err(e) = heartbeat.heartbeat(&batch.topic, batch.partition, batch.generation).await {
                        if e.is_revoked() {
                            // Keep waiting: the row may still land, but nothing will be committed
                            Self::mark_revoked(report, &self.context.metrics);
                        } else {
                            warn!(topic = %batch.topic, partition = batch.partition, error = %e, "heartbeat failed");
                        }
                    }
                }
            }
        };

        match result {
            Ok(event_id) => {
                self.context.metrics.record_written();
                MessageOutcome::Written(event_id)
            }
            Err(e) => {
                self.context.metrics.record_write_failure();
                warn!(
                    topic = %batch.topic,
                    partition = batch.partition,
                    offset = message.offset,
                    deployment_id = %event.deployment_id,
                    sink = self.context.sink.name(),
                    error = %e,
                    "durable write failed, offset left uncommitted"
                );
                MessageOutcome::WriteFailed
            }
        }
    }

    /// Commit the watermark if it moved
    async fn flush(
        &mut self,
        batch: &MessageBatch,
        committer: &dyn OffsetCommitter,
        report: &mut BatchReport,
    ) {
        let metrics = Arc::clone(&self.context.metrics);
        let coordinator = self.coordinator_mut(batch.generation);
        coordinator.flushed();

        let Some(next_offset) = coordinator.pending_commit() else {
            return;
        };

        match committer
            .commit(&batch.topic, batch.partition, next_offset)
            .await
        {
            Ok(()) => {
                coordinator.mark_committed(next_offset);
                metrics.record_commit();
                debug!(topic = %batch.topic, partition = batch.partition, next_offset, "offsets committed");
            }
            Err(e) if e.is_revoked() => {
                Self::mark_revoked(report, &metrics);
                metrics.record_commit_failure();
                info!(topic = %batch.topic, partition = batch.partition, "partition revoked during commit");
            }
            Err(e) => {
                metrics.record_commit_failure();
                warn!(
                    topic = %batch.topic,
                    partition = batch.partition,
                    next_offset,
                    error = %e,
                    "offset commit failed, will retry at next flush"
                );
            }
        }
    }

    fn coordinator_mut(&mut self, generation: u64) -> &mut CommitCoordinator {
        let commit_every = self.context.commit_every;
        self.coordinator
            .get_or_insert_with(|| CommitCoordinator::new(generation, commit_every))
    }

    fn mark_revoked(report: &mut BatchReport, metrics: &IngestMetrics) {
        if !report.revoked {
            report.revoked = true;
            metrics.record_revocation();
        }
    }

    fn abandon(report: &mut BatchReport, messages: &[TransportMessage], metrics: &IngestMetrics) {
        report
            .outcomes
            .extend(messages.iter().map(|m| (m.offset, MessageOutcome::Abandoned)));
        metrics.record_abandoned(messages.len() as u64);
        info!(
            topic = %report.topic,
            partition = report.partition,
            abandoned = messages.len(),
            "partition revoked, abandoning remaining messages"
        );
    }
}

#[cfg(test)]
#[path = "processor_test.rs"]
mod tests;
