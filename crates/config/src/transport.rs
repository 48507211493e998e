//! Transport (Kafka) consumer configuration
//!
//! Connection, consumer group and batching settings for the ordered log
//! topic that build jobs write to.

use serde::Deserialize;
use std::time::Duration;

/// Default topic build jobs publish log events to
pub const DEFAULT_TOPIC: &str = "container-logs";

/// Kafka consumer configuration
///
/// # Example
///
/// ```toml
/// [transport]
/// brokers = ["kafka-1:9092", "kafka-2:9092"]
/// group_id = "log-ingest"
/// topic = "container-logs"
/// session_timeout = "30s"
/// heartbeat_interval = "3s"
/// max_poll_interval = "5m"
/// max_batch_size = 500
/// batch_linger = "50ms"
///
/// # Optional SASL/PLAIN over TLS
/// sasl_username = "ingest"
/// sasl_password = "secret"
/// ssl_ca_location = "/etc/shipyard/kafka-ca.pem"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Bootstrap brokers (host:port)
    /// Default: ["localhost:9092"]
    pub brokers: Vec<String>,

    /// Client identifier reported to the brokers
    /// Default: "shipyard"
    pub client_id: String,

    /// Consumer group id; committed offsets are stored per group
    /// Default: "shipyard-log-ingest"
    pub group_id: String,

    /// Topic to consume
    /// Default: "container-logs"
    pub topic: String,

    /// Group session timeout
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub session_timeout: Duration,

    /// Liveness signal interval, must be shorter than `session_timeout`
    /// Default: 3s
    #[serde(with = "humantime_serde")]
    pub heartbeat_interval: Duration,

    /// Longest gap between two reads before the broker considers the
    /// consumer stuck and reassigns its partitions. At least `session_timeout`.
    /// Default: 5m
    #[serde(with = "humantime_serde")]
    pub max_poll_interval: Duration,

    /// Maximum messages pulled into one batch
    /// Default: 500
    pub max_batch_size: usize,

    /// How long to wait for more messages after the first one of a batch
    /// Default: 50ms
    #[serde(with = "humantime_serde")]
    pub batch_linger: Duration,

    /// Bounded queue between the reader and each partition worker (in batches)
    /// Default: 4
    pub partition_queue_size: usize,

    /// SASL/PLAIN username (enables SASL_SSL when set)
    pub sasl_username: Option<String>,

    /// SASL/PLAIN password
    pub sasl_password: Option<String>,

    /// CA certificate used to verify the brokers
    pub ssl_ca_location: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            brokers: vec!["localhost:9092".to_string()],
            client_id: "shipyard".to_string(),
            group_id: "shipyard-log-ingest".to_string(),
            topic: DEFAULT_TOPIC.to_string(),
            session_timeout: Duration::from_secs(30),
            heartbeat_interval: Duration::from_secs(3),
            max_poll_interval: Duration::from_secs(300),
            max_batch_size: 500,
            batch_linger: Duration::from_millis(50),
            partition_queue_size: 4,
            sasl_username: None,
            sasl_password: None,
            ssl_ca_location: None,
        }
    }
}

impl TransportConfig {
    /// Comma-separated broker list as librdkafka expects it
    pub fn bootstrap_servers(&self) -> String {
        self.brokers.join(",")
    }

    /// Whether SASL credentials were provided
    pub fn uses_sasl(&self) -> bool {
        self.sasl_username.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TransportConfig::default();
        assert_eq!(config.topic, "container-logs");
        assert_eq!(config.bootstrap_servers(), "localhost:9092");
        assert!(config.heartbeat_interval < config.session_timeout);
        assert!(config.max_poll_interval >= config.session_timeout);
        assert!(!config.uses_sasl());
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
brokers = ["a:9092", "b:9092"]
client_id = "api-server"
group_id = "api-server-logs-consumer"
session_timeout = "45s"
heartbeat_interval = "5s"
max_poll_interval = "10m"
max_batch_size = 100
batch_linger = "10ms"
sasl_username = "avnadmin"
sasl_password = "pw"
ssl_ca_location = "kafka.pem"
"#;
        let config: TransportConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.bootstrap_servers(), "a:9092,b:9092");
        assert_eq!(config.group_id, "api-server-logs-consumer");
        assert_eq!(config.session_timeout, Duration::from_secs(45));
        assert_eq!(config.max_poll_interval, Duration::from_secs(600));
        assert_eq!(config.batch_linger, Duration::from_millis(10));
        assert_eq!(config.max_batch_size, 100);
        assert!(config.uses_sasl());
        assert_eq!(config.ssl_ca_location.as_deref(), Some("kafka.pem"));
    }
}
