//! Data models for the metadata store

mod deployment;
mod project;

pub use deployment::{Deployment, DeploymentStatus};
pub use project::Project;
