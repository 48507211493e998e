//! Deployment directory - resolves a deployment to its project's log channel
//!
//! The fan-out path asks one question of the metadata store: which project
//! owns this deployment, and under which channel key do its viewers listen.
//! Unknown deployments resolve to `None`; only store failures are errors.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;

use shipyard_protocol::ChannelName;

use crate::db::ControlPlane;
use crate::error::{ControlError, Result};
use crate::repos::text_column;

/// Where a deployment's live logs go
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectRoute {
    pub project_id: String,
    /// Project subdomain
    pub channel_key: String,
}

impl ProjectRoute {
    pub fn new(project_id: impl Into<String>, channel_key: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            channel_key: channel_key.into(),
        }
    }

    /// `logs:<channel_key>`
    pub fn channel(&self) -> ChannelName {
        ChannelName::for_project(&self.channel_key)
    }
}

/// Metadata lookup used by the fan-out publisher
#[async_trait]
pub trait DeploymentDirectory: Send + Sync {
    /// Resolve a deployment id; `Ok(None)` when no such deployment exists
    async fn resolve(&self, deployment_id: &str) -> Result<Option<ProjectRoute>>;
}

const RESOLVE_SQL: &str = r#"
SELECT p.id, p.subdomain FROM deployments d
INNER JOIN projects p ON p.id = d.project_id
WHERE d.id = ?1
"#;

#[async_trait]
impl DeploymentDirectory for ControlPlane {
    async fn resolve(&self, deployment_id: &str) -> Result<Option<ProjectRoute>> {
        let conn = self.db().connect()?;
        let mut rows = conn.query(RESOLVE_SQL, [deployment_id]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(ProjectRoute {
                project_id: text_column(&row, 0)?,
                channel_key: text_column(&row, 1)?,
            })),
            None => Ok(None),
        }
    }
}

// =============================================================================
// Static Directory
// =============================================================================

/// Fixed in-memory directory
///
/// Used by tests in place of the metadata database. Individual
/// deployments can be marked as failing to simulate an unavailable store.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    routes: RwLock<HashMap<String, ProjectRoute>>,
    failing: RwLock<HashSet<String>>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with_route(
        self,
        deployment_id: impl Into<String>,
        project_id: impl Into<String>,
        channel_key: impl Into<String>,
    ) -> Self {
        self.insert(deployment_id, ProjectRoute::new(project_id, channel_key));
        self
    }

    pub fn insert(&self, deployment_id: impl Into<String>, route: ProjectRoute) {
        self.routes.write().insert(deployment_id.into(), route);
    }

    /// Make lookups for `deployment_id` fail until [`StaticDirectory::recover`]
    pub fn fail_lookups(&self, deployment_id: impl Into<String>) {
        self.failing.write().insert(deployment_id.into());
    }

    pub fn recover(&self, deployment_id: &str) {
        self.failing.write().remove(deployment_id);
    }
}

#[async_trait]
impl DeploymentDirectory for StaticDirectory {
    async fn resolve(&self, deployment_id: &str) -> Result<Option<ProjectRoute>> {
        if self.failing.read().contains(deployment_id) {
            return Err(ControlError::Unavailable(format!(
                "lookup failed for deployment {deployment_id}"
            )));
        }
        Ok(self.routes.read().get(deployment_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Deployment, Project};

    #[tokio::test]
    async fn test_resolve_known_deployment() {
        let cp = ControlPlane::new_memory().await.unwrap();
        let project = Project::new("Acme", "https://github.com/acme/site", "acme");
        cp.projects().create(&project).await.unwrap();
        cp.deployments()
            .create(&Deployment::new(&project.id).with_id("d1"))
            .await
            .unwrap();

        let route = cp.resolve("d1").await.unwrap().unwrap();
        assert_eq!(route.project_id, project.id);
        assert_eq!(route.channel_key, "acme");
        assert_eq!(route.channel().as_str(), "logs:acme");
    }

    #[tokio::test]
    async fn test_resolve_unknown_deployment_is_none() {
        let cp = ControlPlane::new_memory().await.unwrap();
        assert!(cp.resolve("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_through_trait_object() {
        let cp = ControlPlane::new_memory().await.unwrap();
        let directory: &dyn DeploymentDirectory = &cp;
        assert!(directory.resolve("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_static_directory() {
        let directory = StaticDirectory::new().with_route("d1", "p1", "acme");

        let route = directory.resolve("d1").await.unwrap().unwrap();
        assert_eq!(route, ProjectRoute::new("p1", "acme"));
        assert!(directory.resolve("d2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_static_directory_failure_injection() {
        let directory = StaticDirectory::new().with_route("d1", "p1", "acme");
        directory.fail_lookups("d1");

        assert!(matches!(
            directory.resolve("d1").await,
            Err(ControlError::Unavailable(_))
        ));

        directory.recover("d1");
        assert!(directory.resolve("d1").await.unwrap().is_some());
    }
}
