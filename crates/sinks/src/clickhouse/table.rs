//! Row types for the `log_events` table
//!
//! ```sql
//! CREATE TABLE log_events (
//!     event_id UUID,
//!     deployment_id String,
//!     log String,
//!     timestamp DateTime64(3) DEFAULT now64(3)
//! ) ENGINE = MergeTree
//! PARTITION BY toYYYYMM(timestamp)
//! ORDER BY (deployment_id, timestamp);
//! ```

use clickhouse::Row;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::StoredLogEvent;

/// Insert row; `timestamp` is left to the column default
#[derive(Debug, Clone, Row, Serialize)]
pub struct LogEventRow {
    #[serde(with = "clickhouse::serde::uuid")]
    pub event_id: Uuid,

    pub deployment_id: String,

    pub log: String,
}

/// Transcript row as returned by the read query
#[derive(Debug, Clone, Row, Deserialize)]
pub struct TranscriptRow {
    #[serde(with = "clickhouse::serde::uuid")]
    pub event_id: Uuid,

    pub deployment_id: String,

    pub log: String,

    /// Insert time in milliseconds since the Unix epoch
    pub timestamp_ms: i64,
}

impl From<TranscriptRow> for StoredLogEvent {
    fn from(row: TranscriptRow) -> Self {
        Self {
            event_id: row.event_id,
            deployment_id: row.deployment_id,
            log: row.log,
            timestamp: row.timestamp_ms,
        }
    }
}
