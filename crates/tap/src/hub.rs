//! ChannelHub - connection registry and channel membership
//!
//! `ChannelHub` is the meeting point between the fan-out publisher and the
//! subscription gateway:
//!
//! - Publish never blocks: delivery is a `try_send` into each member's queue
//! - A joining connection gets its acknowledgement before any channel message
//! - Closed connections are removed on disconnect and by a periodic sweep
//!
//! # Usage
//!
//! ```ignore
//! let hub = Arc::new(ChannelHub::new(HubConfig::default()));
//!
//! // Gateway side:
//! let (id, rx) = hub.connect()?;
//! hub.join(id, &ChannelName::for_project("acme"))?;
//!
//! // Fan-out side:
//! hub.publish(&ChannelName::for_project("acme"), "Build started");
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use shipyard_protocol::ChannelName;

use crate::connection::Connection;
use crate::error::{Result, TapError};
use crate::protocol::join_ack;

/// Interval for cleanup of closed connections
const CLEANUP_INTERVAL: Duration = Duration::from_secs(5);

/// Publishing side of the hub, as seen by the fan-out path
pub trait ChannelPublisher: Send + Sync {
    /// Deliver `message` to every current member of `channel`
    ///
    /// Fire-and-forget: returns how many connections accepted the message
    /// into their queues, never an error.
    fn publish(&self, channel: &ChannelName, message: &str) -> usize;
}

/// Hub limits
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum concurrent connections
    pub max_connections: usize,
    /// Per-connection queue capacity
    pub connection_buffer: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
            connection_buffer: 256,
        }
    }
}

impl HubConfig {
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_connection_buffer(mut self, buffer: usize) -> Self {
        self.connection_buffer = buffer;
        self
    }
}

/// Connection registry plus channel membership
#[derive(Debug)]
pub struct ChannelHub {
    config: HubConfig,
    /// All live connections by id
    connections: RwLock<HashMap<u64, Arc<Connection>>>,
    /// Channel → members, in join order
    channels: RwLock<HashMap<ChannelName, Vec<Arc<Connection>>>>,
    next_id: AtomicU64,
    /// Total publish calls
    published: AtomicU64,
    /// Total messages queued to connections
    delivered: AtomicU64,
    /// Messages lost to full connection queues
    dropped: AtomicU64,
    /// Total successful joins
    joins: AtomicU64,
}

impl ChannelHub {
    /// Create a hub
    pub fn new(config: HubConfig) -> Self {
        Self {
            config,
            connections: RwLock::new(HashMap::new()),
            channels: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            published: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            joins: AtomicU64::new(0),
        }
    }

    /// Register a new connection
    ///
    /// Returns the connection ID and the receiving end of its queue.
    pub fn connect(&self) -> Result<(u64, mpsc::Receiver<Arc<str>>)> {
        let mut connections = self.connections.write();

        if connections.len() >= self.config.max_connections {
            return Err(TapError::MaxConnections {
                max: self.config.max_connections,
            });
        }

        let (sender, receiver) = mpsc::channel(self.config.connection_buffer.max(1));
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        connections.insert(id, Arc::new(Connection::new(id, sender)));

        debug!(connection_id = id, "connection registered");
        Ok((id, receiver))
    }

    /// Add a connection to a channel and queue the join acknowledgement
    ///
    /// The acknowledgement is queued under the membership lock, so it
    /// precedes every message published to the channel afterwards. Joining
    /// twice acknowledges twice but delivers each message once. When the
    /// queue has no room for the acknowledgement the join is refused and
    /// membership is unchanged.
    pub fn join(&self, id: u64, channel: &ChannelName) -> Result<()> {
        let connection = self
            .connections
            .read()
            .get(&id)
            .cloned()
            .ok_or(TapError::ConnectionNotFound { id })?;

        let mut channels = self.channels.write();
        if !connection.try_deliver(Arc::from(join_ack(channel))) {
            return Err(TapError::QueueFull {
                id,
                channel: channel.to_string(),
            });
        }
        if connection.add_channel(channel) {
            channels
                .entry(channel.clone())
                .or_default()
                .push(connection);
        }

        self.joins.fetch_add(1, Ordering::Relaxed);
        debug!(connection_id = id, channel = %channel, "connection joined channel");
        Ok(())
    }

    /// Remove a connection from the registry and all its channels
    pub fn disconnect(&self, id: u64) -> Result<()> {
        let connection = self
            .connections
            .write()
            .remove(&id)
            .ok_or(TapError::ConnectionNotFound { id })?;

        let mut channels = self.channels.write();
        for channel in connection.channels() {
            if let Some(members) = channels.get_mut(&channel) {
                members.retain(|c| c.id() != id);
                if members.is_empty() {
                    channels.remove(&channel);
                }
            }
        }

        debug!(connection_id = id, dropped = connection.dropped(), "connection removed");
        Ok(())
    }

    /// Number of registered connections
    pub fn connection_count(&self) -> usize {
        self.connections.read().len()
    }

    /// Number of members of a channel
    pub fn member_count(&self, channel: &ChannelName) -> usize {
        self.channels.read().get(channel).map_or(0, Vec::len)
    }

    /// Remove connections whose socket task has gone away
    ///
    /// Called periodically by the maintenance task.
    pub fn cleanup(&self) -> usize {
        let closed: Vec<u64> = self
            .connections
            .read()
            .values()
            .filter(|c| !c.is_connected())
            .map(|c| c.id())
            .collect();

        let removed = closed
            .into_iter()
            .filter(|id| self.disconnect(*id).is_ok())
            .count();

        if removed > 0 {
            debug!(removed, "cleaned up closed connections");
        }
        removed
    }

    /// Spawn the periodic cleanup task, stopped by `cancel`
    pub fn spawn_maintenance(
        self: &Arc<Self>,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let hub = Arc::clone(self);

        tokio::spawn(async move {
            let mut cleanup_interval = tokio::time::interval(CLEANUP_INTERVAL);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = cleanup_interval.tick() => {
                        hub.cleanup();
                    }
                }
            }
        })
    }

    /// Get hub statistics
    pub fn stats(&self) -> HubStats {
        HubStats {
            connections: self.connections.read().len(),
            channels: self.channels.read().len(),
            published: self.published.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            joins: self.joins.load(Ordering::Relaxed),
        }
    }
}

impl Default for ChannelHub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}

impl ChannelPublisher for ChannelHub {
    fn publish(&self, channel: &ChannelName, message: &str) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);

        let channels = self.channels.read();
        let Some(members) = channels.get(channel) else {
            trace!(channel = %channel, "publish to channel without members");
            return 0;
        };

        let message: Arc<str> = Arc::from(message);
        let mut delivered = 0;
        for connection in members {
            if connection.try_deliver(Arc::clone(&message)) {
                delivered += 1;
            } else if connection.is_connected() {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }

        self.delivered.fetch_add(delivered as u64, Ordering::Relaxed);
        delivered
    }
}

/// Statistics about the hub
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct HubStats {
    /// Current number of connections
    pub connections: usize,
    /// Channels with at least one member
    pub channels: usize,
    /// Total publish calls
    pub published: u64,
    /// Total messages queued to connections
    pub delivered: u64,
    /// Messages lost to full connection queues
    pub dropped: u64,
    /// Total joins
    pub joins: u64,
}

#[cfg(test)]
#[path = "hub_test.rs"]
mod tests;
