//! Repository layer for metadata access

mod deployments;
mod projects;

pub use deployments::DeploymentRepo;
pub use projects::ProjectRepo;

use chrono::{DateTime, Utc};

use crate::error::Result;

/// Read a TEXT column, empty when NULL
pub(crate) fn text_column(row: &turso::Row, idx: usize) -> Result<String> {
    Ok(row
        .get_value(idx)?
        .as_text()
        .cloned()
        .unwrap_or_default())
}

/// Read an RFC 3339 TEXT column, falling back to now when unparseable
pub(crate) fn timestamp_column(row: &turso::Row, idx: usize) -> Result<DateTime<Utc>> {
    let raw = text_column(row, idx)?;
    Ok(DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now()))
}

/// Map SQLite unique violations onto `AlreadyExists`
pub(crate) fn is_unique_violation(err: &turso::Error) -> bool {
    err.to_string().contains("UNIQUE constraint")
}
