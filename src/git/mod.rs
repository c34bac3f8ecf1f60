//! Version-control operations: cloning history for backup and pushing it
//! back on restore.
//!
//! # Example
//!
//! ```rust,no_run
//! use org_backup::git::{GitAuth, GitClient, VersionControlClient};
//! use std::path::Path;
//!
//! let git = GitClient::new(GitAuth::token("ghp_your_token_here"));
//! let tree = git.clone_all("https://github.com/acme/r1.git", Path::new("/backups/acme/r1/r1_clone"))?;
//! git.snapshot_as_archive(&tree, Path::new("/backups/acme/r1/r1_clone.zip"), "HEAD")?;
//! # Ok::<(), org_backup::error::BackupError>(())
//! ```

mod auth;
mod branch;
mod client;
mod commit;
mod push;

pub use auth::{GitAuth, authenticated_url, redact_url};
pub use branch::BranchOps;
pub use client::GitClient;
pub use commit::CommitOps;
pub use push::PushOps;

use crate::error::Result;
use git2::{Repository, RepositoryInitOptions};
use std::path::{Path, PathBuf};

/// A local working tree produced by a clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingTree {
    pub path: PathBuf,
}

impl WorkingTree {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Clone, snapshot, and push operations the pipeline consumes.
pub trait VersionControlClient {
    /// Clone every branch of `remote_url` into `destination`.
    ///
    /// Fails with [`BackupError::CloneFailed`](crate::error::BackupError::CloneFailed)
    /// on transport or authentication errors.
    fn clone_all(&self, remote_url: &str, destination: &Path) -> Result<WorkingTree>;

    /// Write the tree at `reference` into a zip at `output`.
    fn snapshot_as_archive(&self, tree: &WorkingTree, output: &Path, reference: &str)
    -> Result<PathBuf>;

    /// Commit the files of `source_tree` into a fresh repository and push its
    /// primary branch to `remote_url`. Returns the pushed branch.
    fn push_history(&self, source_tree: &Path, remote_url: &str) -> Result<String>;
}

/// Git operations wrapper around a single repository.
pub struct GitOps {
    repo: Repository,
    auth: GitAuth,
}

impl GitOps {
    /// Open an existing repository.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let repo = Repository::open(path.as_ref())?;
        Ok(Self {
            repo,
            auth: GitAuth::None,
        })
    }

    /// Initialize a new repository whose unborn HEAD points at `branch`.
    pub fn init(path: impl AsRef<Path>, branch: &str) -> Result<Self> {
        let mut options = RepositoryInitOptions::new();
        options.initial_head(branch);
        let repo = Repository::init_opts(path.as_ref(), &options)?;
        Ok(Self {
            repo,
            auth: GitAuth::None,
        })
    }

    /// Set authentication method for remote operations.
    pub fn with_auth(mut self, auth: GitAuth) -> Self {
        self.auth = auth;
        self
    }

    /// Get a reference to the underlying git2::Repository.
    pub fn repo(&self) -> &Repository {
        &self.repo
    }
}
