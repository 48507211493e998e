//! Deployment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Deployment entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Unique identifier (UUID), also the `DEPLOYMENT_ID` on log events
    pub id: String,
    /// Owning project
    pub project_id: String,
    /// Build status
    #[serde(default)]
    pub status: DeploymentStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Deployment {
    /// Create a queued deployment for a project
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: project_id.into(),
            status: DeploymentStatus::Queued,
            created_at: Utc::now(),
        }
    }

    /// Use a caller-chosen id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Deployment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentStatus {
    #[default]
    Queued,
    InProgress,
    Ready,
    Failed,
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::InProgress => "IN_PROGRESS",
            Self::Ready => "READY",
            Self::Failed => "FAILED",
        }
    }

    /// Unknown values read back as `Queued`
    pub fn parse(s: &str) -> Self {
        match s {
            "IN_PROGRESS" => Self::InProgress,
            "READY" => Self::Ready,
            "FAILED" => Self::Failed,
            _ => Self::Queued,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_deployment_is_queued() {
        let deployment = Deployment::new("p1");
        assert_eq!(deployment.project_id, "p1");
        assert_eq!(deployment.status, DeploymentStatus::Queued);
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            DeploymentStatus::Queued,
            DeploymentStatus::InProgress,
            DeploymentStatus::Ready,
            DeploymentStatus::Failed,
        ] {
            assert_eq!(DeploymentStatus::parse(status.as_str()), status);
        }
        assert_eq!(DeploymentStatus::parse("bogus"), DeploymentStatus::Queued);
    }
}
