//! Read-only access to directory (LDAP) groups.
//!
//! The sync only ever needs one thing from the directory: the list of groups
//! matching a filter, reduced to their common names. [`GroupDirectory`] is that
//! seam; [`LdapDirectory`] is the real implementation.

pub mod client;
pub mod error;

use async_trait::async_trait;
use ldap3::SearchEntry;

pub use client::LdapDirectory;
pub use error::{DirectoryError, Result};

/// Attribute holding the group's display identifier
pub const COMMON_NAME_ATTRIBUTE: &str = "cn";

/// A group found by a directory search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryGroup {
    /// Distinguished name of the entry, kept for diagnostics
    pub dn: String,
    /// First value of the entry's `cn`, or empty if it has none
    pub common_name: String,
}

impl DirectoryGroup {
    pub fn new(dn: impl Into<String>, common_name: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            common_name: common_name.into(),
        }
    }

    /// Reduce a search entry to its group name.
    ///
    /// A missing `cn` is not an error here; the entry comes back with an empty
    /// common name and callers decide what to do with it.
    pub fn from_entry(entry: SearchEntry) -> Self {
        let common_name = entry
            .attrs
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(COMMON_NAME_ATTRIBUTE))
            .and_then(|(_, values)| values.first().cloned())
            .unwrap_or_default();

        Self {
            dn: entry.dn,
            common_name,
        }
    }
}

/// Source of directory groups
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    /// Subtree search under `base_dn` for entries matching `filter`, in server order
    async fn search_groups(&self, base_dn: &str, filter: &str) -> Result<Vec<DirectoryGroup>>;
}
