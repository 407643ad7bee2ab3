use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClusterError>;

#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("Kubeconfig '{path}' could not be loaded: {message}")]
    Config { path: PathBuf, message: String },

    #[error("No usable cluster credentials: {0}")]
    Connection(String),

    #[error("Failed to update config map {namespace}/{name}: {source}")]
    Api {
        namespace: String,
        name: String,
        #[source]
        source: kube::Error,
    },
}
