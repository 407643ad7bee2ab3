//! Environment-driven settings for the LDAP to Argo CD RBAC synchronizer.
//!
//! Values are read once at startup. Nothing here validates them: an unset
//! variable becomes an empty string and the failure surfaces later, when the
//! corresponding connection is attempted.

use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};

/// Namespace holding the Argo CD RBAC config map unless overridden.
pub const DEFAULT_RBAC_NAMESPACE: &str = "argocd";

/// Name of the Argo CD RBAC config map unless overridden.
pub const DEFAULT_RBAC_CONFIGMAP: &str = "argocd-rbac-cm";

const REDACTED: &str = "********";

/// Directory (LDAP) connection parameters
#[derive(Debug, Clone, Default, Serialize)]
pub struct LdapSettings {
    pub host: String,
    pub bind_user: String,
    pub bind_password: String,
    pub user_base_dn: String,
    pub user_filter: String,
    pub group_base_dn: String,
    pub group_filter: String,
}

/// Argo CD API parameters
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArgoSettings {
    pub host: String,
    pub username: String,
    pub password: String,
}

/// Kubernetes access and the location of the RBAC config map
#[derive(Debug, Clone, Serialize)]
pub struct ClusterSettings {
    /// Explicit kubeconfig file; in-cluster credentials are used when absent
    pub kubeconfig: Option<PathBuf>,
    pub rbac_namespace: String,
    pub rbac_configmap: String,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            rbac_namespace: DEFAULT_RBAC_NAMESPACE.to_string(),
            rbac_configmap: DEFAULT_RBAC_CONFIGMAP.to_string(),
        }
    }
}

/// Everything a sync run needs to know about its surroundings
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncSettings {
    pub ldap: LdapSettings,
    pub argo: ArgoSettings,
    pub cluster: ClusterSettings,
}

impl SyncSettings {
    /// Load settings from the process environment, reading `./.env` first if present
    pub fn from_env() -> Self {
        if let Ok(cwd) = env::current_dir() {
            Self::load_dotenv(&cwd);
        }
        Self::from_current_env()
    }

    /// Load settings from the process environment without touching `.env`
    pub fn from_current_env() -> Self {
        let settings = Self {
            ldap: LdapSettings {
                host: var("LDAP_HOST"),
                bind_user: var("LDAP_BIND_USER"),
                bind_password: var("LDAP_BIND_PASS"),
                user_base_dn: var("LDAP_USER_BASE_DN"),
                user_filter: var("LDAP_USER_FILTER"),
                group_base_dn: var("LDAP_GROUP_BASE_DN"),
                group_filter: var("LDAP_GROUP_FILTER"),
            },
            argo: ArgoSettings {
                host: var("ARGO_HOST"),
                username: var("ARGO_USER"),
                password: var("ARGO_PASS"),
            },
            cluster: ClusterSettings {
                kubeconfig: env::var_os("KUBECONFIG")
                    .filter(|value| !value.is_empty())
                    .map(PathBuf::from),
                rbac_namespace: var_or("ARGOCD_NAMESPACE", DEFAULT_RBAC_NAMESPACE),
                rbac_configmap: var_or("ARGOCD_RBAC_CONFIGMAP", DEFAULT_RBAC_CONFIGMAP),
            },
        };

        tracing::debug!(
            ldap_host = %settings.ldap.host,
            argo_host = %settings.argo.host,
            kubeconfig = ?settings.cluster.kubeconfig,
            "Loaded settings from environment"
        );

        settings
    }

    /// A copy safe to print: passwords are masked, empty ones stay empty
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.ldap.bind_password = mask(&copy.ldap.bind_password);
        copy.argo.password = mask(&copy.argo.password);
        copy
    }

    fn load_dotenv(dir: &Path) {
        let env_file = dir.join(".env");
        if env_file.exists() {
            if let Err(e) = dotenv::from_path(&env_file) {
                tracing::warn!(path = %env_file.display(), error = %e, "Ignoring unreadable .env file");
            }
        }
    }
}

fn var(name: &str) -> String {
    env::var(name).unwrap_or_default()
}

fn var_or(name: &str, default: &str) -> String {
    match env::var(name) {
        Ok(value) if !value.is_empty() => value,
        _ => default.to_string(),
    }
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        REDACTED.to_string()
    }
}
