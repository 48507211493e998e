//! ClickHouse sink errors

/// Errors from ClickHouse sink
#[derive(Debug, thiserror::Error)]
pub enum ClickHouseSinkError {
    /// ClickHouse client error
    #[error("clickhouse error: {0}")]
    ClickHouse(#[from] clickhouse::error::Error),

    /// Insert error
    #[error("insert error: {0}")]
    InsertError(String),

    /// Schema setup error
    #[error("schema error: {0}")]
    SchemaError(String),
}
