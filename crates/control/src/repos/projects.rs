//! Project repository

use tracing::info;
use turso::Database;

use super::{is_unique_violation, text_column, timestamp_column};
use crate::error::{ControlError, Result};
use crate::models::Project;

const PROJECT_COLUMNS: &str = "id, name, git_url, subdomain, created_at";

/// Project repository
pub struct ProjectRepo<'a> {
    db: &'a Database,
}

impl<'a> ProjectRepo<'a> {
    /// Create a new project repository
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a project; the subdomain must be unused
    pub async fn create(&self, project: &Project) -> Result<()> {
        project.validate()?;
        let conn = self.db.connect()?;

        let result = conn
            .execute(
                r#"
                INSERT INTO projects (id, name, git_url, subdomain, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                [
                    project.id.as_str(),
                    project.name.as_str(),
                    project.git_url.as_str(),
                    project.subdomain.as_str(),
                    project.created_at.to_rfc3339().as_str(),
                ],
            )
            .await;

        if let Err(e) = result {
            if is_unique_violation(&e) {
                return Err(ControlError::already_exists("project", &project.subdomain));
            }
            return Err(e.into());
        }

        info!(project_id = %project.id, subdomain = %project.subdomain, "created project");
        Ok(())
    }

    /// Get a project by ID
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Project>> {
        self.fetch_one(&format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"), id)
            .await
    }

    /// Get a project by subdomain
    pub async fn get_by_subdomain(&self, subdomain: &str) -> Result<Option<Project>> {
        self.fetch_one(
            &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE subdomain = ?1"),
            subdomain,
        )
        .await
    }

    async fn fetch_one(&self, sql: &str, key: &str) -> Result<Option<Project>> {
        let conn = self.db.connect()?;
        let mut rows = conn.query(sql, [key]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_project(&row)?))
        } else {
            Ok(None)
        }
    }

    fn row_to_project(row: &turso::Row) -> Result<Project> {
        Ok(Project {
            id: text_column(row, 0)?,
            name: text_column(row, 1)?,
            git_url: text_column(row, 2)?,
            subdomain: text_column(row, 3)?,
            created_at: timestamp_column(row, 4)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ControlPlane;

    async fn setup() -> ControlPlane {
        ControlPlane::new_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_project() {
        let cp = setup().await;
        let repo = cp.projects();

        let project = Project::new("Acme", "https://github.com/acme/site", "acme");
        repo.create(&project).await.unwrap();

        let found = repo.get_by_id(&project.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Acme");
        assert_eq!(found.git_url, "https://github.com/acme/site");
        assert_eq!(found.subdomain, "acme");

        let by_subdomain = repo.get_by_subdomain("acme").await.unwrap().unwrap();
        assert_eq!(by_subdomain.id, project.id);
    }

    #[tokio::test]
    async fn test_missing_project() {
        let cp = setup().await;
        assert!(cp.projects().get_by_id("nope").await.unwrap().is_none());
        assert!(cp.projects().get_by_subdomain("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_subdomain_fails() {
        let cp = setup().await;
        let repo = cp.projects();

        repo.create(&Project::new("One", "https://git/one", "acme"))
            .await
            .unwrap();
        let result = repo
            .create(&Project::new("Two", "https://git/two", "acme"))
            .await;

        assert!(matches!(
            result,
            Err(ControlError::AlreadyExists { entity: "project", .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_subdomain_rejected() {
        let cp = setup().await;
        let result = cp
            .projects()
            .create(&Project::new("Bad", "https://git/bad", "Not Valid"))
            .await;
        assert!(matches!(
            result,
            Err(ControlError::Invalid { field: "subdomain", .. })
        ));
    }
}
