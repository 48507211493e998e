//! Shipyard Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! An empty file is valid: it consumes `container-logs` from a local broker
//! and writes to a local ClickHouse.
//!
//! # Parsing
//!
//! ```
//! use shipyard_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[transport]\ngroup_id = \"api-server-logs-consumer\"").unwrap();
//! assert_eq!(config.transport.topic, "container-logs");
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [log]
//! level = "info"
//!
//! [transport]
//! brokers = ["kafka:9092"]
//! group_id = "log-ingest"
//!
//! [sink]
//! type = "clickhouse"
//! url = "http://clickhouse:8123"
//!
//! [metadata]
//! database = "/var/lib/shipyard/metadata.db"
//!
//! [gateway]
//! port = 9002
//! ```

mod error;
mod fanout;
mod gateway;
mod logging;
mod metadata;
mod metrics;
mod pipeline;
mod sink;
mod transport;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use fanout::FanoutConfig;
pub use gateway::GatewayConfig;
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use metadata::MetadataConfig;
pub use metrics::MetricsConfig;
pub use pipeline::PipelineConfig;
pub use sink::{ClickHouseSinkConfig, MemorySinkConfig, SinkConfig};
pub use transport::{DEFAULT_TOPIC, TransportConfig};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Metrics reporting configuration
    pub metrics: MetricsConfig,

    /// Kafka consumer settings
    pub transport: TransportConfig,

    /// Durable log store
    pub sink: SinkConfig,

    /// Project/deployment database
    pub metadata: MetadataConfig,

    /// Live publish queue
    pub fanout: FanoutConfig,

    /// Viewer subscription gateway and HTTP routes
    pub gateway: GatewayConfig,

    /// Commit and shutdown tuning
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or
    /// fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::str::FromStr;
    use std::time::Duration;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.transport.topic, DEFAULT_TOPIC);
        assert_eq!(config.sink.type_name(), "clickhouse");
        assert_eq!(config.gateway.port, 9002);
        assert!(config.fanout.enabled);
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[log]
level = "debug"
format = "json"

[metrics]
interval = "5s"

[transport]
brokers = ["kafka-1:9092"]
group_id = "api-server-logs-consumer"
heartbeat_interval = "2s"

[sink]
type = "memory"

[metadata]
database = "/tmp/meta.db"
lookup_timeout = "1s"

[fanout]
queue_size = 64

[gateway]
port = 9100

[pipeline]
commit_every = 10
"#;
        let config = Config::from_str(toml).unwrap();

        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(config.metrics.interval, Duration::from_secs(5));
        assert_eq!(config.transport.group_id, "api-server-logs-consumer");
        assert_eq!(config.sink.type_name(), "memory");
        assert_eq!(config.metadata.lookup_timeout, Duration::from_secs(1));
        assert_eq!(config.fanout.queue_size, 64);
        assert_eq!(config.gateway.port, 9100);
        assert_eq!(config.pipeline.commit_every, 10);
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_str("invalid { toml");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_from_file_missing() {
        let result = Config::from_file("/nonexistent/shipyard.toml");
        assert!(matches!(result, Err(ConfigError::IoError { .. })));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[gateway]\nport = 9500").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.gateway.port, 9500);
    }
}
