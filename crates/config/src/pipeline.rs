//! Ingestion pipeline tuning

use serde::Deserialize;
use std::time::Duration;

/// Pipeline configuration
///
/// # Example
///
/// ```toml
/// [pipeline]
/// commit_every = 100
/// shutdown_timeout = "30s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Flush the commit watermark after this many settled messages, in
    /// addition to the flush at the end of every batch
    /// Default: 100
    pub commit_every: usize,

    /// Bound on each shutdown wait (in-flight batch, publisher drain)
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            commit_every: 100,
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}
