//! Kafka batch reader
//!
//! Consumes the log topic through a librdkafka group consumer with automatic
//! commits disabled. Offsets are committed explicitly by the partition
//! workers once a message is durably stored.
//!
//! Assignment changes are detected by comparing the consumer's assignment on
//! every poll and heartbeat. Any change bumps the generation, which makes
//! heartbeats from batches read under the old assignment fail.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Message};
use rdkafka::{Offset, TopicPartitionList};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use shipyard_config::TransportConfig;

use crate::error::TransportError;
use crate::transport::{BatchSource, Heartbeat, MessageBatch, OffsetCommitter, TransportMessage};

/// How long a poll waits for the first message of a batch
const IDLE_POLL_TIMEOUT: Duration = Duration::from_secs(1);

/// Build the librdkafka client configuration
pub fn client_config(config: &TransportConfig) -> ClientConfig {
    let mut client = ClientConfig::new();
    client
        .set("bootstrap.servers", config.bootstrap_servers())
        .set("client.id", &config.client_id)
        .set("group.id", &config.group_id)
        .set("enable.auto.commit", "false")
        .set("enable.auto.offset.store", "false")
        .set("auto.offset.reset", "earliest")
        .set("enable.partition.eof", "false")
        .set(
            "session.timeout.ms",
            config.session_timeout.as_millis().to_string(),
        )
        .set(
            "heartbeat.interval.ms",
            config.heartbeat_interval.as_millis().to_string(),
        )
        .set(
            "max.poll.interval.ms",
            config.max_poll_interval.as_millis().to_string(),
        );

    if let Some(username) = &config.sasl_username {
        client
            .set("security.protocol", "SASL_SSL")
            .set("sasl.mechanisms", "PLAIN")
            .set("sasl.username", username)
            .set(
                "sasl.password",
                config.sasl_password.clone().unwrap_or_default(),
            );
    } else if config.ssl_ca_location.is_some() {
        client.set("security.protocol", "SSL");
    }

    if let Some(ca) = &config.ssl_ca_location {
        client.set("ssl.ca.location", ca);
    }

    client
}

#[derive(Debug, Default)]
struct Assignment {
    partitions: BTreeSet<i32>,
    generation: u64,
}

/// Kafka implementation of the transport capabilities
pub struct KafkaBatchReader {
    consumer: Arc<StreamConsumer>,
    topic: String,
    max_batch_size: usize,
    linger: Duration,
    assignment: Mutex<Assignment>,
}

impl KafkaBatchReader {
    /// Create the consumer and subscribe to the configured topic
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let consumer: StreamConsumer = client_config(config).create()?;
        consumer.subscribe(&[config.topic.as_str()])?;

        info!(
            brokers = %config.bootstrap_servers(),
            group_id = %config.group_id,
            topic = %config.topic,
            sasl = config.uses_sasl(),
            "kafka consumer subscribed"
        );

        Ok(Self {
            consumer: Arc::new(consumer),
            topic: config.topic.clone(),
            max_batch_size: config.max_batch_size.max(1),
            linger: config.batch_linger,
            assignment: Mutex::new(Assignment::default()),
        })
    }

    /// Compare the consumer's assignment with the last one seen, returning
    /// the current generation
    fn refresh_assignment(&self) -> u64 {
        let current: BTreeSet<i32> = match self.consumer.assignment() {
            Ok(list) => list
                .elements_for_topic(&self.topic)
                .iter()
                .map(|element| element.partition())
                .collect(),
            Err(e) => {
                warn!(error = %e, "failed to read partition assignment");
                return self.assignment.lock().generation;
            }
        };

        let mut assignment = self.assignment.lock();
        if assignment.partitions != current {
            assignment.generation += 1;
            info!(
                topic = %self.topic,
                partitions = ?current,
                generation = assignment.generation,
                "partition assignment changed"
            );
            assignment.partitions = current;
        }
        assignment.generation
    }

    fn owns(&self, partition: i32, generation: u64) -> bool {
        let current = self.refresh_assignment();
        current == generation && self.assignment.lock().partitions.contains(&partition)
    }
}

fn to_transport_message(message: &BorrowedMessage<'_>) -> TransportMessage {
    TransportMessage {
        offset: message.offset(),
        key: message.key().map(Bytes::copy_from_slice),
        payload: message.payload().map(Bytes::copy_from_slice),
    }
}

#[async_trait]
impl BatchSource for KafkaBatchReader {
    async fn poll(&self) -> Result<Vec<MessageBatch>, TransportError> {
        let first = match tokio::time::timeout(IDLE_POLL_TIMEOUT, self.consumer.recv()).await {
            Ok(result) => result?,
            Err(_) => {
                self.refresh_assignment();
                return Ok(Vec::new());
            }
        };

        let mut grouped: BTreeMap<i32, Vec<TransportMessage>> = BTreeMap::new();
        grouped
            .entry(first.partition())
            .or_default()
            .push(to_transport_message(&first));
        drop(first);

        let deadline = Instant::now() + self.linger;
        let mut count = 1;
        while count < self.max_batch_size {
            match tokio::time::timeout_at(deadline, self.consumer.recv()).await {
                Ok(Ok(message)) => {
                    grouped
                        .entry(message.partition())
                        .or_default()
                        .push(to_transport_message(&message));
                    count += 1;
                }
                Ok(Err(e)) => {
                    // Hand out what we have; the error will resurface on the next poll
                    warn!(error = %e, "kafka receive failed mid-batch");
                    break;
                }
                Err(_) => break,
            }
        }

        let generation = self.refresh_assignment();
        debug!(messages = count, partitions = grouped.len(), "polled kafka batch");

        Ok(grouped
            .into_iter()
            .map(|(partition, messages)| MessageBatch {
                topic: self.topic.clone(),
                partition,
                generation,
                messages,
            })
            .collect())
    }

    fn pause(&self, topic: &str, partition: i32) -> Result<(), TransportError> {
        let mut list = TopicPartitionList::new();
        list.add_partition(topic, partition);
        self.consumer.pause(&list)?;
        Ok(())
    }

    fn resume(&self, topic: &str, partition: i32) -> Result<(), TransportError> {
        let mut list = TopicPartitionList::new();
        list.add_partition(topic, partition);
        self.consumer.resume(&list)?;
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.consumer.unsubscribe();
        info!(topic = %self.topic, "kafka consumer unsubscribed");
        Ok(())
    }
}

#[async_trait]
impl OffsetCommitter for KafkaBatchReader {
    async fn commit(
        &self,
        topic: &str,
        partition: i32,
        next_offset: i64,
    ) -> Result<(), TransportError> {
        let mut list = TopicPartitionList::new();
        list.add_partition_offset(topic, partition, Offset::Offset(next_offset))?;

        let consumer = Arc::clone(&self.consumer);
        let result = tokio::task::spawn_blocking(move || consumer.commit(&list, CommitMode::Sync))
            .await
            .map_err(|e| TransportError::commit_failed(topic, partition, e.to_string()))?;

        result.map_err(|e| {
            self.refresh_assignment();
            if self.assignment.lock().partitions.contains(&partition) {
                TransportError::commit_failed(topic, partition, e.to_string())
            } else {
                TransportError::revoked(topic, partition)
            }
        })
    }
}

#[async_trait]
impl Heartbeat for KafkaBatchReader {
    async fn heartbeat(
        &self,
        topic: &str,
        partition: i32,
        generation: u64,
    ) -> Result<(), TransportError> {
        // librdkafka keeps the group session alive on its own thread and the
        // dispatcher keeps polling; what is left to check is that the
        // partition is still ours
        if self.owns(partition, generation) {
            Ok(())
        } else {
            Err(TransportError::revoked(topic, partition))
        }
    }
}
