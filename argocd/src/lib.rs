//! Minimal Argo CD REST client: session login, project listing, project creation.

pub mod client;
pub mod error;
pub mod models;

use async_trait::async_trait;

pub use client::ArgoClient;
pub use error::{ArgoError, Result};
pub use models::Project;

/// What happened to a create-project call that got a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// The server refused with 409; another writer got there first
    AlreadyExists,
}

/// Project operations the sync depends on
#[async_trait]
pub trait ProjectService: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<Project>>;

    /// Create `project` without upsert
    async fn create_project(&self, project: &Project) -> Result<CreateOutcome>;
}
