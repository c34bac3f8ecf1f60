//! Per-stage outcome tracking shared by backup and restore.

use crate::error::{BackupError, Result};
use std::fmt;
use tracing::warn;

/// A fault-isolated step of a repository backup or restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Labels,
    Issues,
    Metadata,
    History,
    Archive,
    Publish,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Labels => "labels",
            Stage::Issues => "issues",
            Stage::Metadata => "metadata",
            Stage::History => "history",
            Stage::Archive => "archive",
            Stage::Publish => "publish",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one repository's backup or restore.
#[derive(Debug)]
pub enum RunResult {
    /// Every requested stage completed.
    Success,
    /// The repository was processed but these stages failed.
    PartialFailure(Vec<Stage>),
    /// The repository could not be processed at all.
    Fatal(BackupError),
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        matches!(self, RunResult::Success)
    }

    /// Whether the repository counts as processed (success or partial failure).
    pub fn is_completed(&self) -> bool {
        !matches!(self, RunResult::Fatal(_))
    }

    pub fn failed_stages(&self) -> &[Stage] {
        match self {
            RunResult::PartialFailure(stages) => stages,
            _ => &[],
        }
    }
}

/// Collects stage results for one repository, logging each failure.
#[derive(Debug)]
pub struct StageLog {
    repo: String,
    failed: Vec<Stage>,
}

impl StageLog {
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            failed: Vec::new(),
        }
    }

    /// Record a stage result. Returns the value on success.
    pub fn record<T>(&mut self, stage: Stage, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(repo = %self.repo, stage = %stage, error = %e, "Stage failed");
                self.mark_failed(stage);
                None
            }
        }
    }

    /// Mark a stage failed without an error, e.g. when some items of it failed.
    pub fn mark_failed(&mut self, stage: Stage) {
        if !self.failed.contains(&stage) {
            self.failed.push(stage);
        }
    }

    pub fn finish(self) -> RunResult {
        if self.failed.is_empty() {
            RunResult::Success
        } else {
            RunResult::PartialFailure(self.failed)
        }
    }
}
