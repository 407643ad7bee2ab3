use anyhow::Result;
use colored::*;
use settings::SyncSettings;

/// Print the effective settings, passwords masked
pub fn show(format: String) -> Result<()> {
    let settings = SyncSettings::from_env().redacted();

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        "yaml" => {
            print!("{}", serde_yaml::to_string(&settings)?);
        }
        _ => {
            print_settings_text(&settings);
        }
    }

    Ok(())
}

fn print_settings_text(settings: &SyncSettings) {
    println!("{}", "=== Argo CD LDAP RBAC Sync Configuration ===".bold());
    println!();

    print_section(
        "ldap",
        &[
            ("host", &settings.ldap.host),
            ("bind_user", &settings.ldap.bind_user),
            ("bind_password", &settings.ldap.bind_password),
            ("user_base_dn", &settings.ldap.user_base_dn),
            ("user_filter", &settings.ldap.user_filter),
            ("group_base_dn", &settings.ldap.group_base_dn),
            ("group_filter", &settings.ldap.group_filter),
        ],
    );

    print_section(
        "argo",
        &[
            ("host", &settings.argo.host),
            ("username", &settings.argo.username),
            ("password", &settings.argo.password),
        ],
    );

    let kubeconfig = settings
        .cluster
        .kubeconfig
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(in-cluster)".to_string());
    print_section(
        "cluster",
        &[
            ("kubeconfig", &kubeconfig),
            ("rbac_namespace", &settings.cluster.rbac_namespace),
            ("rbac_configmap", &settings.cluster.rbac_configmap),
        ],
    );
}

fn print_section(name: &str, values: &[(&str, &String)]) {
    println!("{}", format!("[{}]", name).cyan().bold());
    for (key, value) in values {
        if value.is_empty() {
            println!("  {}: {}", key.cyan(), "(unset)".dimmed());
        } else {
            println!("  {}: {}", key.cyan(), value.yellow());
        }
    }
    println!();
}
