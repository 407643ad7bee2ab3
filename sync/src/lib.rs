//! Reconciles directory groups with Argo CD projects and publishes the
//! resulting RBAC policy.
//!
//! The engine never constructs its own clients. The directory, the project
//! service and the config map store come in as trait objects, so a run can be
//! pointed at fakes as easily as at live systems.

pub mod engine;
pub mod error;
pub mod policy;

pub use engine::{SyncEngine, SyncOptions, SyncReport, PROJECT_DESCRIPTION};
pub use error::{Result, SyncError};
pub use policy::{PolicyDocument, PolicyRow, DEFAULT_ROLE};
