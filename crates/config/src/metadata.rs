//! Metadata store configuration
//!
//! Location of the project/deployment database used to resolve which
//! project's channel a deployment's log lines are published on.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Metadata store configuration
///
/// # Example
///
/// ```toml
/// [metadata]
/// database = "~/.shipyard/metadata.db"   # default
/// lookup_timeout = "2s"                  # default
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Path to the SQLite-compatible database file
    /// Default: "~/.shipyard/metadata.db" (expanded at runtime)
    pub database: Option<PathBuf>,

    /// Upper bound on a single deployment lookup
    /// Default: 2s
    #[serde(with = "humantime_serde")]
    pub lookup_timeout: Duration,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            database: None,
            lookup_timeout: Duration::from_secs(2),
        }
    }
}

impl MetadataConfig {
    /// Get the database path, expanding ~ to home directory
    pub fn database_path(&self) -> PathBuf {
        if let Some(ref path) = self.database {
            expand_tilde(path)
        } else {
            dirs::home_dir()
                .map(|h| h.join(".shipyard").join("metadata.db"))
                .unwrap_or_else(|| PathBuf::from("./data/metadata.db"))
        }
    }
}

/// Expand ~ to home directory
fn expand_tilde(path: &Path) -> PathBuf {
    path.to_str()
        .and_then(|s| s.strip_prefix("~/"))
        .and_then(|stripped| dirs::home_dir().map(|home| home.join(stripped)))
        .unwrap_or_else(|| path.to_path_buf())
}
