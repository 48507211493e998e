//! Durable sink configuration
//!
//! Exactly one durable store receives every ingested log event. The store
//! type is selected with the `type` key.

use serde::Deserialize;
use std::time::Duration;

/// Durable store selection
///
/// # Example
///
/// ```toml
/// [sink]
/// type = "clickhouse"
/// url = "http://clickhouse:8123"
/// database = "default"
/// username = "default"
/// password = ""
/// table = "log_events"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkConfig {
    /// ClickHouse over HTTP
    Clickhouse(ClickHouseSinkConfig),

    /// In-process store, lost on restart (local development)
    Memory(MemorySinkConfig),
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self::Clickhouse(ClickHouseSinkConfig::default())
    }
}

impl SinkConfig {
    /// Get the sink type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Clickhouse(_) => "clickhouse",
            Self::Memory(_) => "memory",
        }
    }
}

/// ClickHouse sink configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClickHouseSinkConfig {
    /// HTTP endpoint
    /// Default: "http://localhost:8123"
    pub url: String,

    /// Default: "default"
    pub database: String,

    /// Default: none
    pub username: Option<String>,

    /// Default: none
    pub password: Option<String>,

    /// Target table
    /// Default: "log_events"
    pub table: String,

    /// Run `CREATE TABLE IF NOT EXISTS` at startup
    /// Default: true
    pub create_table: bool,

    /// Use server-side async inserts, waiting for the flush before acknowledging
    /// Default: true
    pub async_insert: bool,

    /// Extra attempts after a failed insert (0 = fail the event immediately)
    /// Default: 0
    pub retry_attempts: usize,

    /// First backoff delay, doubled per attempt
    /// Default: 100ms
    #[serde(with = "humantime_serde")]
    pub retry_base_delay: Duration,

    /// Backoff ceiling
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub retry_max_delay: Duration,
}

impl Default for ClickHouseSinkConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8123".to_string(),
            database: "default".to_string(),
            username: None,
            password: None,
            table: "log_events".to_string(),
            create_table: true,
            async_insert: true,
            retry_attempts: 0,
            retry_base_delay: Duration::from_millis(100),
            retry_max_delay: Duration::from_secs(5),
        }
    }
}

/// In-memory sink configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MemorySinkConfig {
    /// Refuse writes once this many events are stored (0 = unbounded)
    /// Default: 0
    pub max_events: usize,
}
