//! Project model
//!
//! A project owns deployments. Its subdomain doubles as the live log channel
//! key: viewers of a project subscribe to `logs:<subdomain>`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, Result};

/// Maximum subdomain length (DNS label limit)
const MAX_SUBDOMAIN_LEN: usize = 63;

/// Project entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier (UUID)
    pub id: String,
    /// Display name
    pub name: String,
    /// Source repository URL
    pub git_url: String,
    /// DNS label, unique across projects
    pub subdomain: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Create a new project with a fresh id
    pub fn new(
        name: impl Into<String>,
        git_url: impl Into<String>,
        subdomain: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            git_url: git_url.into(),
            subdomain: subdomain.into(),
            created_at: Utc::now(),
        }
    }

    /// Check fields before insert
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ControlError::invalid("name", "must not be empty"));
        }
        validate_subdomain(&self.subdomain)
    }
}

/// Subdomains are lowercase DNS labels: `[a-z0-9-]`, no leading or trailing hyphen
pub fn validate_subdomain(subdomain: &str) -> Result<()> {
    if subdomain.is_empty() || subdomain.len() > MAX_SUBDOMAIN_LEN {
        return Err(ControlError::invalid(
            "subdomain",
            format!("length must be 1..={MAX_SUBDOMAIN_LEN}"),
        ));
    }
    if subdomain.starts_with('-') || subdomain.ends_with('-') {
        return Err(ControlError::invalid(
            "subdomain",
            "must not start or end with '-'",
        ));
    }
    if !subdomain
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err(ControlError::invalid(
            "subdomain",
            format!("'{subdomain}' may only contain a-z, 0-9 and '-'"),
        ));
    }
    Ok(())
}
