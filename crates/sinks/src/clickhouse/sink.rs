//! ClickHouse sink implementation
//!
//! One insert per event. With `async_insert` enabled the server batches
//! small inserts itself; `wait_for_async_insert=1` keeps the acknowledgement
//! tied to durability, so a returned `Ok` is safe to commit against.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use clickhouse::{Client, insert::Insert};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shipyard_protocol::LogEvent;

use super::config::ClickHouseConfig;
use super::error::ClickHouseSinkError;
use super::metrics::ClickHouseMetrics;
use super::table::{LogEventRow, TranscriptRow};
use crate::{
    LogSink, Result, SinkError, SinkMetricsSnapshot, StoredLogEvent, TranscriptReader,
    new_event_id,
};

// =============================================================================
// ClickHouse Log Sink
// =============================================================================

/// Durable log store backed by a ClickHouse table
pub struct ClickHouseLogSink {
    /// Configuration
    config: ClickHouseConfig,

    /// ClickHouse client (cheap to clone, pooled HTTP connections)
    client: Client,

    /// Metrics (Arc for sharing with the metrics endpoint)
    metrics: Arc<ClickHouseMetrics>,

    /// Set by `close`
    closed: AtomicBool,
}

impl ClickHouseLogSink {
    /// Create a new ClickHouse sink
    pub fn new(config: ClickHouseConfig) -> Self {
        let client = config.build_client();

        Self {
            client,
            config,
            metrics: Arc::new(ClickHouseMetrics::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Get reference to config
    pub fn config(&self) -> &ClickHouseConfig {
        &self.config
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &ClickHouseMetrics {
        &self.metrics
    }

    /// Create the log table if configured to
    pub async fn ensure_schema(&self) -> std::result::Result<(), ClickHouseSinkError> {
        if !self.config.create_table {
            debug!(table = %self.config.qualified_table(), "table creation disabled");
            return Ok(());
        }

        self.client
            .query(&self.config.create_table_sql())
            .execute()
            .await
            .map_err(|e| ClickHouseSinkError::SchemaError(e.to_string()))?;

        info!(
            url = %self.config.url,
            table = %self.config.qualified_table(),
            "clickhouse log table ready"
        );
        Ok(())
    }

    /// Insert with retry logic
    async fn insert_with_retry(
        &self,
        row: &LogEventRow,
    ) -> std::result::Result<(), ClickHouseSinkError> {
        let mut delay = self.config.retry_base_delay;

        for attempt in 0..=self.config.retry_attempts {
            if attempt > 0 {
                self.metrics.record_retry();
                warn!(
                    table = %self.config.table,
                    attempt = attempt,
                    max_attempts = self.config.retry_attempts,
                    delay_ms = delay.as_millis(),
                    "retrying insert"
                );
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, self.config.retry_max_delay);
            }

            match self.do_insert(row).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.config.retry_attempts => {
                    warn!(error = %e, table = %self.config.table, attempt = attempt, "insert failed, will retry");
                }
                Err(e) => return Err(e),
            }
        }

        Err(ClickHouseSinkError::InsertError(format!(
            "max retries exceeded for table {}",
            self.config.table
        )))
    }

    /// Perform the actual insert
    async fn do_insert(&self, row: &LogEventRow) -> std::result::Result<(), ClickHouseSinkError> {
        let mut insert: Insert<LogEventRow> = self.client.insert(&self.config.table).await?;
        insert.write(row).await?;
        insert.end().await?;
        Ok(())
    }
}

#[async_trait]
impl LogSink for ClickHouseLogSink {
    fn name(&self) -> &str {
        "clickhouse"
    }

    async fn write(&self, event: &LogEvent) -> Result<Uuid> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SinkError::Closed);
        }

        let row = LogEventRow {
            event_id: new_event_id(),
            deployment_id: event.deployment_id.clone(),
            log: event.log_line.clone(),
        };

        match self.insert_with_retry(&row).await {
            Ok(()) => {
                self.metrics.record_written();
                debug!(event_id = %row.event_id, deployment_id = %row.deployment_id, "log event stored");
                Ok(row.event_id)
            }
            Err(e) => {
                self.metrics.record_error();
                Err(e.into())
            }
        }
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            let snapshot = self.metrics.snapshot();
            info!(
                written = snapshot.events_written,
                errors = snapshot.write_errors,
                retries = snapshot.retry_count,
                "clickhouse sink closed"
            );
        }
        Ok(())
    }

    fn metrics_snapshot(&self) -> SinkMetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl TranscriptReader for ClickHouseLogSink {
    async fn transcript(&self, deployment_id: &str) -> Result<Vec<StoredLogEvent>> {
        self.metrics.record_transcript_query();

        let rows = self
            .client
            .query(&self.config.transcript_sql())
            .bind(deployment_id)
            .fetch_all::<TranscriptRow>()
            .await
            .map_err(ClickHouseSinkError::from)?;

        Ok(rows.into_iter().map(StoredLogEvent::from).collect())
    }
}
