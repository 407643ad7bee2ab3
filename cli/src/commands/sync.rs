use anyhow::{Context, Result};
use argocd::{ArgoClient, ProjectService};
use async_trait::async_trait;
use cluster::{ConfigMapStore, KubeConfigMaps};
use colored::*;
use directory::{GroupDirectory, LdapDirectory};
use settings::{ArgoSettings, ClusterSettings, LdapSettings, SyncSettings};
use ::sync::{SyncEngine, SyncOptions, SyncReport};

/// Opens the three backends a sync talks to
#[async_trait]
pub trait Backends: Send + Sync {
    async fn directory(&self, settings: &LdapSettings) -> Result<Box<dyn GroupDirectory>>;
    async fn projects(&self, settings: &ArgoSettings) -> Result<Box<dyn ProjectService>>;
    async fn config_maps(&self, settings: &ClusterSettings) -> Result<Box<dyn ConfigMapStore>>;
}

/// LDAP, Argo CD and Kubernetes as configured
pub struct LiveBackends;

#[async_trait]
impl Backends for LiveBackends {
    async fn directory(&self, settings: &LdapSettings) -> Result<Box<dyn GroupDirectory>> {
        let directory =
            LdapDirectory::connect(&settings.host, &settings.bind_user, &settings.bind_password)
                .await
                .context("Failed to connect to directory")?;
        Ok(Box::new(directory))
    }

    async fn projects(&self, settings: &ArgoSettings) -> Result<Box<dyn ProjectService>> {
        let argo = ArgoClient::login(&settings.host, &settings.username, &settings.password)
            .await
            .context("Failed to log in to Argo CD")?;
        Ok(Box::new(argo))
    }

    async fn config_maps(&self, settings: &ClusterSettings) -> Result<Box<dyn ConfigMapStore>> {
        let config_maps = KubeConfigMaps::connect(settings.kubeconfig.as_deref())
            .await
            .context("Failed to create Kubernetes client")?;
        Ok(Box::new(config_maps))
    }
}

/// Connect to all three backends, then run one sync
pub async fn execute(dry_run: bool) -> Result<()> {
    let settings = SyncSettings::from_env();
    tracing::info!(dry_run, "Starting sync");

    let options = SyncOptions {
        group_base_dn: settings.ldap.group_base_dn.clone(),
        group_filter: settings.ldap.group_filter.clone(),
        rbac_namespace: settings.cluster.rbac_namespace.clone(),
        rbac_configmap: settings.cluster.rbac_configmap.clone(),
        dry_run,
    };

    let report = connect_and_sync(&LiveBackends, &settings, &options).await?;

    print_report(&report, &options);
    Ok(())
}

/// Open the directory, then Argo CD, then the cluster, and sync. A failed
/// connection stops the run before anything is read from or written to the others.
async fn connect_and_sync(
    backends: &dyn Backends,
    settings: &SyncSettings,
    options: &SyncOptions,
) -> Result<SyncReport> {
    let directory = backends.directory(&settings.ldap).await?;
    let projects = backends.projects(&settings.argo).await?;
    let config_maps = backends.config_maps(&settings.cluster).await?;

    SyncEngine::new(&*directory, &*projects, &*config_maps)
        .run(options)
        .await
        .context("Sync failed")
}

fn print_report(report: &SyncReport, options: &SyncOptions) {
    if options.dry_run {
        println!("{}", "=== Dry Run ===".bold());
        println!();
        for name in &report.created_projects {
            println!("  {} {}", "would create project".yellow(), name.cyan());
        }
        println!();
        println!(
            "{}",
            format!(
                "{}/{} (not written)",
                options.rbac_namespace, options.rbac_configmap
            )
            .bold()
        );
        print!("{}", report.policy_csv);
        return;
    }

    for name in &report.created_projects {
        println!("  {} {}", "created project".green(), name.cyan());
    }
    for name in &report.conflicting_projects {
        println!("  {} {}", "already existed".yellow(), name.cyan());
    }
    println!(
        "{}",
        format!(
            "Synced {} groups into {}/{}",
            report.groups.len(),
            options.rbac_namespace,
            options.rbac_configmap
        )
        .green()
    );
}
