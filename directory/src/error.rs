use thiserror::Error;

pub type Result<T> = std::result::Result<T, DirectoryError>;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Failed to connect to directory at '{url}': {source}")]
    Connection {
        url: String,
        #[source]
        source: ldap3::LdapError,
    },

    #[error("Directory bind rejected for '{bind_dn}': {message}")]
    Auth { bind_dn: String, message: String },

    #[error("Directory search under '{base_dn}' failed: {message}")]
    Search { base_dn: String, message: String },
}
