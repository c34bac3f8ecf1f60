//! Restoring repositories from a backup archive.

mod orchestrator;
mod task;

pub use orchestrator::OrganizationRestoreOrchestrator;
pub use task::RepositoryRestoreTask;

use crate::stage::RunResult;
use std::path::PathBuf;

/// Outcome of restoring one bundle.
pub type RestoreRunResult = RunResult;

/// Which optional stages a restore runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreOptions {
    /// Push the cloned history found in each bundle.
    pub restore_history: bool,
}

/// Per-item counts of a label or issue restore.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    pub created: usize,
    /// Already present on the destination.
    pub skipped: usize,
    pub failed: usize,
}

/// Result for a single bundle.
#[derive(Debug)]
pub struct RepoRestoreResult {
    pub name: String,
    pub bundle: PathBuf,
    pub status: RestoreRunResult,
}

/// Result of restoring an archive.
#[derive(Debug)]
pub struct RestoreResult {
    /// Repositories whose destination was resolved and restored, possibly
    /// with stage failures.
    pub restored: Vec<String>,
    pub repo_results: Vec<RepoRestoreResult>,
}
