use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::EnvFilter;

mod commands;

/// Argo CD LDAP RBAC sync - Mirror directory groups into Argo CD projects and RBAC policy
#[derive(Parser)]
#[command(name = "argocd-ldap-rbac-sync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one synchronization (the default)
    Sync {
        /// Show what would change without creating projects or updating the config map
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the effective configuration with secrets redacted
    Config {
        /// Output format (json, yaml, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is for results and the final error line
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli.command.unwrap_or(Commands::Sync { dry_run: false })).await {
        println!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Sync { dry_run } => commands::sync::execute(dry_run).await,
        Commands::Config { format } => commands::config::show(format),
    }
}
