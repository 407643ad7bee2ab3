//! Kubernetes access for publishing the RBAC config map.

pub mod error;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, instrument};

pub use error::{ClusterError, Result};

/// Writes whole config maps
#[async_trait]
pub trait ConfigMapStore: Send + Sync {
    /// Replace the `data` of an existing config map. Fails if it does not exist.
    async fn replace_config_map(
        &self,
        namespace: &str,
        name: &str,
        data: BTreeMap<String, String>,
    ) -> Result<()>;
}

/// [`ConfigMapStore`] backed by a live Kubernetes API server
#[derive(Clone)]
pub struct KubeConfigMaps {
    client: Client,
}

impl KubeConfigMaps {
    /// Build a client from `kubeconfig` when given, otherwise from the pod's service account
    pub async fn connect(kubeconfig: Option<&Path>) -> Result<Self> {
        let config = match kubeconfig {
            Some(path) => {
                debug!(path = %path.display(), "Using kubeconfig file");
                let kubeconfig = load_kubeconfig(path).await?;
                Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await
                    .map_err(|e| ClusterError::Config {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?
            }
            None => {
                debug!("Using in-cluster service account");
                Config::incluster().map_err(|e| ClusterError::Connection(e.to_string()))?
            }
        };

        let client =
            Client::try_from(config).map_err(|e| ClusterError::Connection(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ConfigMapStore for KubeConfigMaps {
    #[instrument(skip(self, data), fields(keys = data.len()))]
    async fn replace_config_map(
        &self,
        namespace: &str,
        name: &str,
        data: BTreeMap<String, String>,
    ) -> Result<()> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);

        // No resourceVersion: an unconditional replace of the whole object
        let config_map = ConfigMap {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            data: Some(data),
            ..Default::default()
        };

        api.replace(name, &PostParams::default(), &config_map)
            .await
            .map_err(|e| ClusterError::Api {
                namespace: namespace.to_string(),
                name: name.to_string(),
                source: e,
            })?;

        info!("Config map replaced");
        Ok(())
    }
}

/// Read and parse a kubeconfig file
pub async fn load_kubeconfig(path: &Path) -> Result<Kubeconfig> {
    let config_error = |message: String| ClusterError::Config {
        path: path.to_path_buf(),
        message,
    };

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| config_error(e.to_string()))?;

    serde_yaml::from_str(&content).map_err(|e| config_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn write_kubeconfig(dir: &TempDir, server: &str) -> PathBuf {
        let path = dir.path().join("kubeconfig");
        std::fs::write(
            &path,
            format!(
                r#"apiVersion: v1
kind: Config
clusters:
- name: test
  cluster:
    server: {server}
contexts:
- name: test
  context:
    cluster: test
    user: test
    namespace: default
current-context: test
users:
- name: test
  user: {{}}
"#
            ),
        )
        .unwrap();
        path
    }

    fn rbac_data() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("policy.default".to_string(), "role:readonly".to_string()),
            (
                "policy.csv".to_string(),
                "p,role:teamA-role,*,*,teamA/*,allow\ng,teamA,role:teamA-role\n".to_string(),
            ),
        ])
    }

    #[tokio::test]
    async fn test_load_kubeconfig() {
        let dir = TempDir::new().unwrap();
        let path = write_kubeconfig(&dir, "https://127.0.0.1:6443");

        let kubeconfig = load_kubeconfig(&path).await.unwrap();
        assert_eq!(kubeconfig.current_context.as_deref(), Some("test"));
        assert_eq!(kubeconfig.clusters.len(), 1);
    }

    #[tokio::test]
    async fn test_load_kubeconfig_missing_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        match load_kubeconfig(&missing).await {
            Err(ClusterError::Config { path, .. }) => assert_eq!(path, missing),
            other => panic!("Expected Config error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_load_kubeconfig_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kubeconfig");
        std::fs::write(&path, "clusters: [unterminated").unwrap();

        assert!(matches!(
            load_kubeconfig(&path).await,
            Err(ClusterError::Config { .. })
        ));
    }

    #[tokio::test]
    async fn test_connect_with_missing_kubeconfig_is_config_error() {
        let dir = TempDir::new().unwrap();
        let result = KubeConfigMaps::connect(Some(&dir.path().join("absent"))).await;
        assert!(matches!(result, Err(ClusterError::Config { .. })));
    }

    #[tokio::test]
    async fn test_connect_outside_cluster_is_connection_error() {
        if std::env::var_os("KUBERNETES_SERVICE_HOST").is_some() {
            // Running inside a pod; in-cluster discovery may legitimately work
            return;
        }
        let result = KubeConfigMaps::connect(None).await;
        assert!(matches!(result, Err(ClusterError::Connection(_))));
    }

    #[tokio::test]
    async fn test_replace_config_map() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/namespaces/argocd/configmaps/argocd-rbac-cm"))
            .and(body_partial_json(json!({
                "metadata": {"name": "argocd-rbac-cm", "namespace": "argocd"},
                "data": {"policy.default": "role:readonly"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "apiVersion": "v1",
                "kind": "ConfigMap",
                "metadata": {"name": "argocd-rbac-cm", "namespace": "argocd"},
                "data": {"policy.default": "role:readonly"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let kubeconfig = write_kubeconfig(&dir, &server.uri());
        let store = KubeConfigMaps::connect(Some(&kubeconfig)).await.unwrap();

        store
            .replace_config_map("argocd", "argocd-rbac-cm", rbac_data())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_replace_missing_config_map_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/namespaces/argocd/configmaps/argocd-rbac-cm"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "kind": "Status",
                "apiVersion": "v1",
                "metadata": {},
                "status": "Failure",
                "message": "configmaps \"argocd-rbac-cm\" not found",
                "reason": "NotFound",
                "code": 404
            })))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let kubeconfig = write_kubeconfig(&dir, &server.uri());
        let store = KubeConfigMaps::connect(Some(&kubeconfig)).await.unwrap();

        let err = store
            .replace_config_map("argocd", "argocd-rbac-cm", rbac_data())
            .await
            .unwrap_err();
        match err {
            ClusterError::Api {
                namespace, name, ..
            } => {
                assert_eq!(namespace, "argocd");
                assert_eq!(name, "argocd-rbac-cm");
            }
            other => panic!("Expected Api error, got {other}"),
        }
    }
}
