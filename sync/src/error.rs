use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Directory(#[from] directory::DirectoryError),

    #[error(transparent)]
    Argo(#[from] argocd::ArgoError),

    #[error(transparent)]
    Cluster(#[from] cluster::ClusterError),

    /// A directory group with no usable common name
    #[error("Directory entry '{dn}' has no cn; refusing to sync an unnamed group")]
    InvalidGroup { dn: String },

    #[error("Failed to render policy: {0}")]
    Policy(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_passes_through() {
        let err: SyncError = directory::DirectoryError::Search {
            base_dn: "ou=groups".to_string(),
            message: "busy".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Directory search under 'ou=groups' failed: busy");

        let err = SyncError::InvalidGroup {
            dn: "ou=odd,dc=example".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Directory entry 'ou=odd,dc=example' has no cn; refusing to sync an unnamed group"
        );
    }
}
