//! Deployment repository

use tracing::info;
use turso::Database;

use super::{is_unique_violation, text_column, timestamp_column};
use crate::error::{ControlError, Result};
use crate::models::{Deployment, DeploymentStatus};

const DEPLOYMENT_COLUMNS: &str = "id, project_id, status, created_at";

/// Deployment repository
pub struct DeploymentRepo<'a> {
    db: &'a Database,
}

impl<'a> DeploymentRepo<'a> {
    /// Create a new deployment repository
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a deployment; its project must exist
    pub async fn create(&self, deployment: &Deployment) -> Result<()> {
        let conn = self.db.connect()?;

        let mut rows = conn
            .query("SELECT id FROM projects WHERE id = ?1", [deployment.project_id.as_str()])
            .await?;
        if rows.next().await?.is_none() {
            return Err(ControlError::not_found("project", &deployment.project_id));
        }

        let result = conn
            .execute(
                r#"
                INSERT INTO deployments (id, project_id, status, created_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                [
                    deployment.id.as_str(),
                    deployment.project_id.as_str(),
                    deployment.status.as_str(),
                    deployment.created_at.to_rfc3339().as_str(),
                ],
            )
            .await;

        if let Err(e) = result {
            if is_unique_violation(&e) {
                return Err(ControlError::already_exists("deployment", &deployment.id));
            }
            return Err(e.into());
        }

        info!(
            deployment_id = %deployment.id,
            project_id = %deployment.project_id,
            "created deployment"
        );
        Ok(())
    }

    /// Get a deployment by ID
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Deployment>> {
        let conn = self.db.connect()?;

        let mut rows = conn
            .query(
                &format!("SELECT {DEPLOYMENT_COLUMNS} FROM deployments WHERE id = ?1"),
                [id],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_deployment(&row)?))
        } else {
            Ok(None)
        }
    }

    fn row_to_deployment(row: &turso::Row) -> Result<Deployment> {
        Ok(Deployment {
            id: text_column(row, 0)?,
            project_id: text_column(row, 1)?,
            status: DeploymentStatus::parse(&text_column(row, 2)?),
            created_at: timestamp_column(row, 3)?,
        })
    }
}
