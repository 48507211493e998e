//! Gateway connections
//!
//! Each connected viewer gets a `Connection` holding the sending half of a
//! bounded queue. The gateway task owning the socket drains the receiving
//! half; publishers never wait on it.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use shipyard_protocol::ChannelName;

/// One connected viewer
#[derive(Debug)]
pub struct Connection {
    /// Unique identifier
    id: u64,
    /// Queue towards the socket task
    sender: mpsc::Sender<Arc<str>>,
    /// Channels this connection joined
    channels: Mutex<HashSet<ChannelName>>,
    /// Messages lost to a full queue
    dropped: AtomicU64,
}

impl Connection {
    pub(crate) fn new(id: u64, sender: mpsc::Sender<Arc<str>>) -> Self {
        Self {
            id,
            sender,
            channels: Mutex::new(HashSet::new()),
            dropped: AtomicU64::new(0),
        }
    }

    /// Get the connection ID
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Queue a message without waiting
    ///
    /// Returns false when the queue is full or the socket task is gone.
    #[inline]
    pub fn try_deliver(&self, message: Arc<str>) -> bool {
        match self.sender.try_send(message) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Check if the socket task is still draining the queue
    #[inline]
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Record a joined channel; false if already a member
    pub(crate) fn add_channel(&self, channel: &ChannelName) -> bool {
        self.channels.lock().insert(channel.clone())
    }

    /// Channels currently joined
    pub fn channels(&self) -> Vec<ChannelName> {
        let mut channels: Vec<_> = self.channels.lock().iter().cloned().collect();
        channels.sort();
        channels
    }

    /// Messages this connection missed because its queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
