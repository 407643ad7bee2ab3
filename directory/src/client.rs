//! LDAP implementation of [`GroupDirectory`].

use async_trait::async_trait;
use ldap3::{DerefAliases, Ldap, LdapConnAsync, Scope, SearchEntry, SearchOptions};
use tracing::{debug, info, instrument, warn};

use crate::error::{DirectoryError, Result};
use crate::{DirectoryGroup, GroupDirectory};

/// LDAP result code for a rejected simple bind
const INVALID_CREDENTIALS: u32 = 49;

/// An authenticated LDAP connection.
///
/// The connection driver runs on a spawned task for as long as the handle is
/// alive; the process exits after one sync so it is never explicitly closed.
pub struct LdapDirectory {
    ldap: Ldap,
}

impl LdapDirectory {
    /// Open a connection to `url` and perform a simple bind.
    #[instrument(skip(bind_password))]
    pub async fn connect(url: &str, bind_dn: &str, bind_password: &str) -> Result<Self> {
        debug!("Connecting to directory");

        let (conn, mut ldap) =
            LdapConnAsync::new(url)
                .await
                .map_err(|e| DirectoryError::Connection {
                    url: url.to_string(),
                    source: e,
                })?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        let result = ldap
            .simple_bind(bind_dn, bind_password)
            .await
            .map_err(|e| DirectoryError::Connection {
                url: url.to_string(),
                source: e,
            })?;

        if result.rc != 0 {
            let message = if result.rc == INVALID_CREDENTIALS {
                "invalid credentials".to_string()
            } else {
                format!("rc={}: {}", result.rc, result.text)
            };
            return Err(DirectoryError::Auth {
                bind_dn: bind_dn.to_string(),
                message,
            });
        }

        info!("Bound to directory");
        Ok(Self { ldap })
    }
}

#[async_trait]
impl GroupDirectory for LdapDirectory {
    #[instrument(skip(self))]
    async fn search_groups(&self, base_dn: &str, filter: &str) -> Result<Vec<DirectoryGroup>> {
        let search_failed = |message: String| DirectoryError::Search {
            base_dn: base_dn.to_string(),
            message,
        };

        // No paging control: a server-side size cap truncates silently
        let mut ldap = self.ldap.clone();
        let (entries, _) = ldap
            .with_search_options(
                SearchOptions::new()
                    .deref(DerefAliases::Never)
                    .sizelimit(0)
                    .timelimit(0),
            )
            .search(base_dn, Scope::Subtree, filter, vec!["*"])
            .await
            .map_err(|e| search_failed(e.to_string()))?
            .success()
            .map_err(|e| search_failed(e.to_string()))?;

        let groups: Vec<DirectoryGroup> = entries
            .into_iter()
            .map(SearchEntry::construct)
            .map(DirectoryGroup::from_entry)
            .collect();

        info!(count = groups.len(), "Directory search returned groups");
        Ok(groups)
    }
}
