//! Fan-out publisher - live copies of stored log lines
//!
//! After a durable write the partition worker hands the event to a
//! [`FanoutHandle`]. A single [`FanoutPublisher`] task resolves the owning
//! project and publishes the raw line to `logs:<channel_key>`.
//!
//! Nothing here can affect commits: `submit` never waits, a full queue drops
//! the live copy, and lookup or publish problems are only logged and counted.
//! The event itself is already durable and reachable through the transcript.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use shipyard_control::DeploymentDirectory;
use shipyard_protocol::LogEvent;
use shipyard_tap::ChannelPublisher;

use crate::metrics::FanoutMetrics;

/// Default bound on a single deployment lookup
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

/// A stored event waiting for its live copy
#[derive(Debug)]
struct FanoutItem {
    deployment_id: String,
    log_line: String,
}

/// Submission side of the fan-out queue
#[derive(Debug, Clone)]
pub struct FanoutHandle {
    sender: mpsc::Sender<FanoutItem>,
    metrics: Arc<FanoutMetrics>,
}

impl FanoutHandle {
    /// Queue an event for publishing without waiting
    ///
    /// Returns false when the live copy was dropped.
    pub fn submit(&self, event: &LogEvent) -> bool {
        let item = FanoutItem {
            deployment_id: event.deployment_id.clone(),
            log_line: event.log_line.clone(),
        };

        match self.sender.try_send(item) {
            Ok(()) => {
                self.metrics.record_submitted();
                true
            }
            Err(mpsc::error::TrySendError::Full(item)) => {
                self.metrics.record_queue_full();
                debug!(deployment_id = %item.deployment_id, "fan-out queue full, live copy dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Shared counters
    pub fn metrics(&self) -> &Arc<FanoutMetrics> {
        &self.metrics
    }
}

/// Resolves deployments and publishes their lines
pub struct FanoutPublisher {
    directory: Arc<dyn DeploymentDirectory>,
    publisher: Arc<dyn ChannelPublisher>,
    lookup_timeout: Duration,
    metrics: Arc<FanoutMetrics>,
}

impl FanoutPublisher {
    /// Create a publisher
    pub fn new(
        directory: Arc<dyn DeploymentDirectory>,
        publisher: Arc<dyn ChannelPublisher>,
    ) -> Self {
        Self {
            directory,
            publisher,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            metrics: Arc::new(FanoutMetrics::new()),
        }
    }

    /// Bound each lookup
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Shared counters
    pub fn metrics(&self) -> &Arc<FanoutMetrics> {
        &self.metrics
    }

    /// Start the publisher task
    ///
    /// The task runs until every [`FanoutHandle`] is dropped, draining what
    /// is already queued.
    pub fn spawn(self, queue_size: usize) -> (FanoutHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(queue_size.max(1));
        let handle = FanoutHandle {
            sender,
            metrics: Arc::clone(&self.metrics),
        };

        let task = tokio::spawn(self.run(receiver));
        (handle, task)
    }

    async fn run(self, mut receiver: mpsc::Receiver<FanoutItem>) {
        while let Some(item) = receiver.recv().await {
            self.publish_one(&item.deployment_id, &item.log_line).await;
        }
        debug!("fan-out publisher stopped");
    }

    /// Resolve and publish one line
    ///
    /// Returns the number of receiving connections, or `None` when the
    /// deployment could not be resolved.
    pub async fn publish_one(&self, deployment_id: &str, log_line: &str) -> Option<usize> {
        let lookup = tokio::time::timeout(self.lookup_timeout, self.directory.resolve(deployment_id));

        let route = match lookup.await {
            Ok(Ok(Some(route))) => route,
            Ok(Ok(None)) => {
                self.metrics.record_unresolved();
                debug!(deployment_id, "no project for deployment, skipping live copy");
                return None;
            }
            Ok(Err(e)) => {
                self.metrics.record_lookup_failure();
                warn!(deployment_id, error = %e, "deployment lookup failed, skipping live copy");
                return None;
            }
            Err(_) => {
                self.metrics.record_lookup_timeout();
                warn!(
                    deployment_id,
                    timeout_ms = self.lookup_timeout.as_millis() as u64,
                    "deployment lookup timed out, skipping live copy"
                );
                return None;
            }
        };

        let channel = route.channel();
        let delivered = self.publisher.publish(&channel, log_line);
        self.metrics.record_published(delivered);
        trace!(deployment_id, channel = %channel, delivered, "published log line");

        Some(delivered)
    }
}

#[cfg(test)]
#[path = "fanout_test.rs"]
mod tests;
