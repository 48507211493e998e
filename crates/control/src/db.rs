//! Database connection and schema management
//!
//! Uses Turso (async SQLite-compatible) for the metadata database. A single
//! file holds both tables; the in-memory mode backs tests.

use std::path::{Path, PathBuf};

use tracing::info;
use turso::{Builder, Database};

use crate::error::{ControlError, Result};

/// Metadata database handle
pub struct ControlPlane {
    db: Database,
    /// `None` for in-memory databases
    path: Option<PathBuf>,
}

impl ControlPlane {
    /// Open (or create) a file-backed metadata database
    ///
    /// Missing parent directories are created.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ControlError::invalid("database", format!("failed to create directory: {}", e))
            })?;
        }

        let path_str = path.to_str().ok_or_else(|| {
            ControlError::invalid("database", format!("non UTF-8 path: {}", path.display()))
        })?;

        info!(path = %path.display(), "opening metadata database");
        let db = Builder::new_local(path_str).build().await?;

        let cp = Self {
            db,
            path: Some(path),
        };
        cp.init_schema().await?;

        Ok(cp)
    }

    /// Create an in-memory metadata database (for testing)
    pub async fn new_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;

        let cp = Self { db, path: None };
        cp.init_schema().await?;

        Ok(cp)
    }

    /// Get the database
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Database file, if file-backed
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.db.connect()?;

        conn.execute(SCHEMA_PROJECTS, ()).await?;
        conn.execute(SCHEMA_DEPLOYMENTS, ()).await?;
        conn.execute(INDEX_DEPLOYMENTS_PROJECT, ()).await?;

        info!("metadata schema initialized");
        Ok(())
    }
}

// =============================================================================
// Schema
// =============================================================================

const SCHEMA_PROJECTS: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    git_url TEXT NOT NULL,
    subdomain TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
)
"#;

const SCHEMA_DEPLOYMENTS: &str = r#"
CREATE TABLE IF NOT EXISTS deployments (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'QUEUED',
    created_at TEXT NOT NULL,
    FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
)
"#;

const INDEX_DEPLOYMENTS_PROJECT: &str =
    "CREATE INDEX IF NOT EXISTS idx_deployments_project ON deployments(project_id)";
