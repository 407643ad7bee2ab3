use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArgoError>;

#[derive(Error, Debug)]
pub enum ArgoError {
    /// The session endpoint refused the credentials
    #[error("Argo CD login rejected (HTTP {status}): {message}")]
    Auth { status: u16, message: String },

    /// The request never produced a response
    #[error("Argo CD request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to decode Argo CD response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// Any other non-2xx response
    #[error("Argo CD API error on {endpoint} (HTTP {status}): {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String,
    },
}
