//! ClickHouse sink configuration
//!
//! Configuration for connecting to ClickHouse and naming the log table.

use std::time::Duration;

use clickhouse::Client;

// =============================================================================
// Constants
// =============================================================================

/// Default log events table
pub const DEFAULT_TABLE: &str = "log_events";

/// Default retry attempts (0 = a failed insert fails the event)
pub const DEFAULT_RETRY_ATTEMPTS: usize = 0;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the ClickHouse log sink
#[derive(Debug, Clone)]
pub struct ClickHouseConfig {
    /// ClickHouse HTTP URL (e.g., "http://localhost:8123")
    pub url: String,

    /// Database name
    pub database: String,

    /// Username for authentication (optional)
    pub username: Option<String>,

    /// Password for authentication (optional)
    pub password: Option<String>,

    /// Log events table
    pub table: String,

    /// Create the table at startup if missing
    pub create_table: bool,

    /// Acknowledge inserts only after the server-side async insert flushed
    pub async_insert: bool,

    /// Number of retry attempts after the first failure
    pub retry_attempts: usize,

    /// Base delay for exponential backoff
    pub retry_base_delay: Duration,

    /// Maximum retry delay
    pub retry_max_delay: Duration,
}

impl Default for ClickHouseConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8123".into(),
            database: "default".into(),
            username: None,
            password: None,
            table: DEFAULT_TABLE.into(),
            create_table: true,
            async_insert: true,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_base_delay: Duration::from_millis(100),
            retry_max_delay: Duration::from_secs(5),
        }
    }
}

impl ClickHouseConfig {
    /// Set the ClickHouse URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the database name
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set authentication credentials
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the log table name
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Set the number of retry attempts
    pub fn with_retry_attempts(mut self, attempts: usize) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Set the backoff bounds
    pub fn with_retry_delays(mut self, base: Duration, max: Duration) -> Self {
        self.retry_base_delay = base;
        self.retry_max_delay = max;
        self
    }

    /// Fully qualified table name
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.database, self.table)
    }

    /// Build the ClickHouse client from this config
    pub fn build_client(&self) -> Client {
        let mut client = Client::default()
            .with_url(&self.url)
            .with_database(&self.database);

        if let Some(ref username) = self.username {
            client = client.with_user(username);
        }

        if let Some(ref password) = self.password {
            client = client.with_password(password);
        }

        if self.async_insert {
            client = client
                .with_option("async_insert", "1")
                .with_option("wait_for_async_insert", "1");
        }

        client
    }

    /// DDL for the log events table
    pub fn create_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    \
                event_id UUID,\n    \
                deployment_id String,\n    \
                log String,\n    \
                timestamp DateTime64(3) DEFAULT now64(3)\n\
            ) ENGINE = MergeTree\n\
            PARTITION BY toYYYYMM(timestamp)\n\
            ORDER BY (deployment_id, timestamp)",
            self.qualified_table()
        )
    }

    /// Transcript query; the deployment id is bound as a parameter
    ///
    /// Ordering is by the millisecond write timestamp only. Lines stored in
    /// the same millisecond have no defined order relative to each other.
    pub fn transcript_sql(&self) -> String {
        format!(
            "SELECT event_id, deployment_id, log, toUnixTimestamp64Milli(timestamp) AS timestamp_ms \
             FROM {} WHERE deployment_id = ? ORDER BY timestamp ASC",
            self.qualified_table()
        )
    }
}

