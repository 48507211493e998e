//! ClickHouse Sink - durable log store
//!
//! Stores one row per ingested log event in `log_events` and serves
//! per-deployment transcripts from the same table.
//!
//! # Features
//!
//! - **Durable acknowledgement**: `async_insert` with `wait_for_async_insert`
//! - **Schema bootstrap**: optional `CREATE TABLE IF NOT EXISTS` at startup
//! - **Retry logic**: exponential backoff, off by default so a failing store
//!   surfaces as an uncommitted event instead of a stalled partition

mod config;
mod error;
mod metrics;
mod sink;
mod table;

pub use config::{ClickHouseConfig, DEFAULT_RETRY_ATTEMPTS, DEFAULT_TABLE};
pub use error::ClickHouseSinkError;
pub use metrics::ClickHouseMetrics;
pub use sink::ClickHouseLogSink;
pub use table::{LogEventRow, TranscriptRow};
