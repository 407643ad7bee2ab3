//! Wire types for the parts of the Argo CD REST API the sync touches.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct SessionRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SessionResponse {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMeta {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSpec {
    #[serde(default)]
    pub description: String,
}

/// An Argo CD AppProject, reduced to the fields the sync reads or writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub metadata: ProjectMeta,
    #[serde(default)]
    pub spec: ProjectSpec,
}

impl Project {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            metadata: ProjectMeta { name: name.into() },
            spec: ProjectSpec {
                description: description.into(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

#[derive(Debug, Deserialize)]
pub struct ProjectList {
    // Argo CD sends `null` rather than `[]` for an empty list
    #[serde(default)]
    pub items: Option<Vec<Project>>,
}

#[derive(Debug, Serialize)]
pub struct ProjectCreateRequest<'a> {
    pub project: &'a Project,
    pub upsert: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_project_list_ignores_unknown_fields() {
        let list: ProjectList = serde_json::from_value(json!({
            "metadata": {"resourceVersion": "42"},
            "items": [{
                "metadata": {"name": "default", "namespace": "argocd", "uid": "abc"},
                "spec": {"sourceRepos": ["*"], "destinations": []},
                "status": {}
            }]
        }))
        .unwrap();

        let items = list.items.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name(), "default");
        assert_eq!(items[0].spec.description, "");
    }

    #[test]
    fn test_project_list_accepts_null_items() {
        let list: ProjectList = serde_json::from_value(json!({"items": null})).unwrap();
        assert!(list.items.is_none());

        let list: ProjectList = serde_json::from_value(json!({})).unwrap();
        assert!(list.items.is_none());
    }

    #[test]
    fn test_create_request_shape() {
        let project = Project::new("teamB", "Created by argocd-ldap-rbac-sync");
        let body = serde_json::to_value(ProjectCreateRequest {
            project: &project,
            upsert: false,
        })
        .unwrap();

        assert_eq!(
            body,
            json!({
                "project": {
                    "metadata": {"name": "teamB"},
                    "spec": {"description": "Created by argocd-ldap-rbac-sync"}
                },
                "upsert": false
            })
        );
    }
}
