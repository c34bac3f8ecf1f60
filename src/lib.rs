//! # org-backup
//!
//! Backup and restore of a GitHub organization's repositories.
//!
//! A backup walks every repository of an organization and writes, per
//! repository, a bundle folder holding its labels, issues, and attributes as
//! JSON, optionally a full clone of its history, and optionally a dated zip
//! uploaded to blob storage. A restore reads such an archive back and
//! recreates labels, issues, attributes, and history on the destination,
//! skipping what is already there.
//!
//! ## Backup
//!
//! ```rust,no_run
//! use org_backup::prelude::*;
//!
//! let github = GitHubClient::new("ghp_your_token_here");
//! let git = GitClient::new(GitAuth::token("ghp_your_token_here"));
//!
//! let options = BackupOptions {
//!     clone_history: true,
//!     ..BackupOptions::default()
//! };
//! let result = OrganizationBackupOrchestrator::new("/backups", &github, &git, &ZipArchiver)
//!     .run("acme", &[], &options)?;
//!
//! for repo in &result.repo_results {
//!     println!("{}: {:?}", repo.name, repo.status);
//! }
//! # Ok::<(), org_backup::error::BackupError>(())
//! ```
//!
//! ## Restore
//!
//! ```rust,no_run
//! use org_backup::prelude::*;
//! use std::path::Path;
//!
//! let github = GitHubClient::new("ghp_your_token_here");
//! let git = GitClient::new(GitAuth::token("ghp_your_token_here"));
//!
//! let result = OrganizationRestoreOrchestrator::new(&github, &git, &ZipArchiver, RestoreOptions::default())
//!     .run("acme", Path::new("/backups/acme/r1_2024-03-02.zip"))?;
//!
//! println!("Restored: {}", result.restored.join(", "));
//! # Ok::<(), org_backup::error::BackupError>(())
//! ```

pub mod archive;
pub mod backup;
pub mod bundle;
pub mod config;
pub mod error;
pub mod git;
pub mod github;
pub mod logging;
pub mod model;
pub mod publish;
pub mod restore;
pub mod stage;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::archive::{Archiver, ZipArchiver};
    pub use crate::backup::{
        BackupOptions, BackupResult, BackupRunResult, OrganizationBackupOrchestrator,
        RepositoryBackupTask,
    };
    pub use crate::bundle::{BundleWriter, LoadedBundle};
    pub use crate::config::{Credentials, PublishSettings};
    pub use crate::error::{BackupError, Result};
    pub use crate::git::{GitAuth, GitClient, VersionControlClient, WorkingTree};
    pub use crate::github::{GitHubClient, Organization, RemoteRepository, ResourceClient};
    pub use crate::model::{
        IssueRecord, IssueState, LabelRecord, OrganizationManifest, RepositorySnapshot,
    };
    pub use crate::publish::{AzureBlobPublisher, BlobPublisher, PublishScope};
    pub use crate::restore::{
        OrganizationRestoreOrchestrator, RepositoryRestoreTask, RestoreOptions, RestoreResult,
        RestoreSummary,
    };
    pub use crate::stage::{RunResult, Stage};
}

pub use prelude::*;
