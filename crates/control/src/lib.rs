//! Shipyard Metadata Store
//!
//! Turso-backed persistence for projects and deployments, plus the
//! [`DeploymentDirectory`] lookup the fan-out path uses to find a
//! deployment's live log channel.
//!
//! # Usage
//!
//! ```ignore
//! use shipyard_control::{ControlPlane, DeploymentDirectory};
//!
//! // File-based (production)
//! let cp = ControlPlane::new("/var/lib/shipyard/metadata.db").await?;
//!
//! // In-memory (testing)
//! let cp = ControlPlane::new_memory().await?;
//!
//! let route = cp.resolve("deployment-id").await?;
//! ```

pub mod db;
pub mod directory;
pub mod error;
pub mod models;
pub mod repos;

// Re-exports
pub use db::ControlPlane;
pub use directory::{DeploymentDirectory, ProjectRoute, StaticDirectory};
pub use error::{ControlError, Result};
pub use models::{Deployment, DeploymentStatus, Project};
pub use repos::{DeploymentRepo, ProjectRepo};

impl ControlPlane {
    /// Get project repository
    pub fn projects(&self) -> ProjectRepo<'_> {
        ProjectRepo::new(self.db())
    }

    /// Get deployment repository
    pub fn deployments(&self) -> DeploymentRepo<'_> {
        DeploymentRepo::new(self.db())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_backed_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("metadata.db");

        let project = Project::new("Acme", "https://github.com/acme/site", "acme");
        {
            let cp = ControlPlane::new(&path).await.unwrap();
            assert_eq!(cp.path(), Some(path.as_path()));
            cp.projects().create(&project).await.unwrap();
        }

        let cp = ControlPlane::new(&path).await.unwrap();
        let found = cp.projects().get_by_subdomain("acme").await.unwrap();
        assert_eq!(found.map(|p| p.id), Some(project.id));
    }

    #[tokio::test]
    async fn test_memory_database_has_no_path() {
        let cp = ControlPlane::new_memory().await.unwrap();
        assert!(cp.path().is_none());
    }
}
