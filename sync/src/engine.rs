//! One full reconciliation pass: directory groups to Argo CD projects and RBAC policy.

use argocd::{CreateOutcome, Project, ProjectService};
use cluster::ConfigMapStore;
use directory::GroupDirectory;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Result, SyncError};
use crate::policy::PolicyDocument;

/// Description given to every project this tool creates
pub const PROJECT_DESCRIPTION: &str = "Created by argocd-ldap-rbac-sync";

/// Where to read groups from and where to publish the policy
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub group_base_dn: String,
    pub group_filter: String,
    pub rbac_namespace: String,
    pub rbac_configmap: String,
    /// Compute everything but create no projects and write nothing to the cluster
    pub dry_run: bool,
}

/// What a run did (or, for a dry run, would have done)
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    /// Group names in directory order
    pub groups: Vec<String>,
    /// Projects created, or that would be created on a dry run
    pub created_projects: Vec<String>,
    /// Creates the server refused because the project already existed
    pub conflicting_projects: Vec<String>,
    pub policy: PolicyDocument,
    pub policy_csv: String,
    /// Whether the config map was written
    pub published: bool,
}

/// Drives a sync against explicitly supplied backends
pub struct SyncEngine<'a> {
    directory: &'a dyn GroupDirectory,
    projects: &'a dyn ProjectService,
    config_maps: &'a dyn ConfigMapStore,
}

impl<'a> SyncEngine<'a> {
    pub fn new(
        directory: &'a dyn GroupDirectory,
        projects: &'a dyn ProjectService,
        config_maps: &'a dyn ConfigMapStore,
    ) -> Self {
        Self {
            directory,
            projects,
            config_maps,
        }
    }

    /// Run every step in order, stopping at the first failure.
    ///
    /// Nothing is rolled back: projects created before a later failure stay.
    pub async fn run(&self, options: &SyncOptions) -> Result<SyncReport> {
        let groups = self
            .directory
            .search_groups(&options.group_base_dn, &options.group_filter)
            .await?;

        // Reject unnamed groups before any remote write happens
        if let Some(unnamed) = groups.iter().find(|g| g.common_name.is_empty()) {
            return Err(SyncError::InvalidGroup {
                dn: unnamed.dn.clone(),
            });
        }

        let mut known_projects = self.projects.list_projects().await?;
        info!(
            groups = groups.len(),
            projects = known_projects.len(),
            "Reconciling directory groups with Argo CD projects"
        );

        let mut policy = PolicyDocument::new();
        let mut created_projects = Vec::new();
        let mut conflicting_projects = Vec::new();

        for group in &groups {
            let name = group.common_name.as_str();

            match known_projects.iter().position(|p| p.name() == name) {
                Some(index) => {
                    debug!(
                        group = %name,
                        description = %known_projects[index].spec.description,
                        "Project exists"
                    );
                }
                None => {
                    let project = Project::new(name, PROJECT_DESCRIPTION);
                    if options.dry_run {
                        info!(group = %name, "Would create project");
                        created_projects.push(name.to_string());
                    } else {
                        match self.projects.create_project(&project).await? {
                            CreateOutcome::Created => created_projects.push(name.to_string()),
                            CreateOutcome::AlreadyExists => {
                                conflicting_projects.push(name.to_string())
                            }
                        }
                    }
                    // Repeated names in the directory result only get one create
                    known_projects.push(project);
                }
            }

            policy.grant_group(name);
        }

        let data = policy.to_config_map_data()?;
        let policy_csv = policy.to_csv()?;

        let published = if options.dry_run {
            info!("Dry run: leaving config map untouched");
            false
        } else {
            self.config_maps
                .replace_config_map(&options.rbac_namespace, &options.rbac_configmap, data)
                .await?;
            true
        };

        if !conflicting_projects.is_empty() {
            warn!(
                projects = ?conflicting_projects,
                "Some projects were created concurrently by someone else"
            );
        }

        info!(
            groups = groups.len(),
            created = created_projects.len(),
            published,
            "Sync finished"
        );

        Ok(SyncReport {
            groups: groups.into_iter().map(|g| g.common_name).collect(),
            created_projects,
            conflicting_projects,
            policy,
            policy_csv,
            published,
        })
    }
}
