//! CLI for backing up and restoring a GitHub organization.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use org_backup::config::{API_URL_ENV, BACKUP_DIR_ENV, ORG_ENV, TOKEN_ENV};
use org_backup::prelude::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "org-backup")]
#[command(author, version, about = "Back up and restore GitHub organization repositories", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Connection {
    /// Organization name
    #[arg(short, long, env = ORG_ENV)]
    org: Option<String>,

    /// Access token
    #[arg(short, long, env = TOKEN_ENV, hide_env_values = true)]
    token: Option<String>,

    /// GitHub Enterprise API base URL
    #[arg(long, env = API_URL_ENV)]
    api_url: Option<String>,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Back up repositories of an organization
    Backup {
        #[command(flatten)]
        connection: Connection,

        /// Output directory
        #[arg(short = 'd', long, env = BACKUP_DIR_ENV)]
        dir: Option<PathBuf>,

        /// Repositories to back up (all when omitted)
        #[arg(short = 'r', long = "repos", num_args = 1..)]
        repos: Vec<String>,

        /// Do not back up labels
        #[arg(long)]
        skip_labels: bool,

        /// Do not back up issues
        #[arg(long)]
        skip_issues: bool,

        /// Clone the full history of each repository
        #[arg(long = "clone")]
        clone_history: bool,

        /// Upload a dated archive of each repository to Azure Blob Storage
        #[arg(long)]
        publish: bool,

        /// Upload only the archive created by this run
        #[arg(long, requires = "publish")]
        publish_latest_only: bool,
    },

    /// Restore repositories from a backup archive
    Restore {
        #[command(flatten)]
        connection: Connection,

        /// Archive to restore (.zip, .tar.gz, .tgz)
        #[arg(short, long)]
        archive: Option<PathBuf>,

        /// Push the cloned history found in the archive
        #[arg(long)]
        history: bool,

        /// Parent directory for temporary extraction
        #[arg(long)]
        scratch_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Backup {
            connection,
            dir,
            repos,
            skip_labels,
            skip_issues,
            clone_history,
            publish,
            publish_latest_only,
        } => {
            let options = BackupOptions {
                include_labels: !skip_labels,
                include_issues: !skip_issues,
                clone_history,
                publish,
                publish_scope: if publish_latest_only {
                    PublishScope::LatestOnly
                } else {
                    PublishScope::AllArchives
                },
            };
            cmd_backup(connection, dir, repos, options)
        }
        Commands::Restore {
            connection,
            archive,
            history,
            scratch_dir,
        } => cmd_restore(connection, archive, history, scratch_dir),
    }
}

fn github_client(token: &str, api_url: Option<String>) -> GitHubClient {
    match api_url {
        Some(url) => GitHubClient::with_enterprise(token, url),
        None => GitHubClient::new(token),
    }
}

fn cmd_backup(
    connection: Connection,
    dir: Option<PathBuf>,
    repos: Vec<String>,
    options: BackupOptions,
) -> Result<()> {
    org_backup::logging::init(org_backup::logging::level_for(connection.verbose))?;

    let credentials = Credentials::resolve(connection.org, connection.token, dir)?;
    let publisher = if options.publish {
        let settings =
            PublishSettings::from_env().context("Publishing requires Azure storage settings")?;
        Some(AzureBlobPublisher::new(
            &settings.account,
            settings.container,
            settings.sas_token,
        ))
    } else {
        None
    };

    let github = github_client(&credentials.token, connection.api_url);
    let git = GitClient::new(GitAuth::token(&credentials.token));

    let mut orchestrator =
        OrganizationBackupOrchestrator::new(&credentials.output_dir, &github, &git, &ZipArchiver);
    if let Some(publisher) = &publisher {
        orchestrator = orchestrator.with_publisher(publisher);
    }

    let result = orchestrator
        .run(&credentials.organization, &repos, &options)
        .with_context(|| format!("Backup of '{}' failed", credentials.organization))?;

    println!(
        "Backed up {} of {} repositories ({} with failures, {} failed)",
        result.summary.succeeded + result.summary.partial,
        result.summary.total_repos,
        result.summary.partial,
        result.summary.failed
    );
    println!("Manifest: {}", result.manifest_path.display());

    Ok(())
}

fn cmd_restore(
    connection: Connection,
    archive: Option<PathBuf>,
    history: bool,
    scratch_dir: Option<PathBuf>,
) -> Result<()> {
    org_backup::logging::init(org_backup::logging::level_for(connection.verbose))?;

    let organization = connection
        .org
        .filter(|org| !org.is_empty())
        .context("Missing organization (--org or GITHUB_ORG)")?;
    let token = connection
        .token
        .filter(|token| !token.is_empty())
        .context("Missing access token (--token or GITHUB_ACCESS_TOKEN)")?;
    let archive = archive.context("Missing archive (--archive)")?;

    let github = github_client(&token, connection.api_url);
    let git = GitClient::new(GitAuth::token(&token));

    let options = RestoreOptions {
        restore_history: history,
    };
    let mut orchestrator = OrganizationRestoreOrchestrator::new(&github, &git, &ZipArchiver, options);
    if let Some(scratch_dir) = scratch_dir {
        orchestrator = orchestrator.with_scratch_root(scratch_dir);
    }

    let result = orchestrator
        .run(&organization, &archive)
        .with_context(|| format!("Restore of {} failed", archive.display()))?;

    println!(
        "Restored {} of {} repositories",
        result.restored.len(),
        result.repo_results.len()
    );
    for repo in &result.repo_results {
        if !repo.status.is_success() {
            println!("  {}: {:?}", repo.name, repo.status);
        }
    }

    Ok(())
}
