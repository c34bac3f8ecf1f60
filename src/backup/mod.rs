//! Organization backup: per-repository tasks driven by an orchestrator.
//!
//! # Example
//!
//! ```rust,no_run
//! use org_backup::archive::ZipArchiver;
//! use org_backup::backup::{BackupOptions, OrganizationBackupOrchestrator};
//! use org_backup::git::{GitAuth, GitClient};
//! use org_backup::github::GitHubClient;
//!
//! let github = GitHubClient::new("ghp_your_token_here");
//! let git = GitClient::new(GitAuth::token("ghp_your_token_here"));
//!
//! let result = OrganizationBackupOrchestrator::new("/backups", &github, &git, &ZipArchiver)
//!     .run("acme", &[], &BackupOptions::default())?;
//!
//! println!("Backed up {} repositories", result.manifest.repositories.len());
//! # Ok::<(), org_backup::error::BackupError>(())
//! ```

mod orchestrator;
mod task;

pub use orchestrator::OrganizationBackupOrchestrator;
pub use task::{RepositoryBackupTask, history_folder_name};

use crate::model::OrganizationManifest;
use crate::publish::PublishScope;
use crate::stage::RunResult;
use std::path::PathBuf;

/// Outcome of backing up one repository.
pub type BackupRunResult = RunResult;

/// Which stages a backup runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupOptions {
    pub include_labels: bool,
    pub include_issues: bool,
    /// Clone the full history and snapshot `HEAD`.
    pub clone_history: bool,
    /// Pack each repository folder and upload it.
    pub publish: bool,
    pub publish_scope: PublishScope,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            include_labels: true,
            include_issues: true,
            clone_history: false,
            publish: false,
            publish_scope: PublishScope::default(),
        }
    }
}

/// Result for a single repository.
#[derive(Debug)]
pub struct RepoBackupResult {
    pub name: String,
    pub path: PathBuf,
    pub status: BackupRunResult,
}

/// Counts across one organization backup.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackupSummary {
    pub total_repos: usize,
    pub succeeded: usize,
    pub partial: usize,
    pub failed: usize,
}

/// Result of backing up an organization.
#[derive(Debug)]
pub struct BackupResult {
    pub manifest: OrganizationManifest,
    /// Where `organization.json` was written.
    pub manifest_path: PathBuf,
    pub repo_results: Vec<RepoBackupResult>,
    pub summary: BackupSummary,
}

impl BackupResult {
    /// Result for a repository by name.
    pub fn repo(&self, name: &str) -> Option<&RepoBackupResult> {
        self.repo_results.iter().find(|r| r.name == name)
    }
}
