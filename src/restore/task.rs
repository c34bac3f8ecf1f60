//! Restore of one bundle into a destination repository.

use crate::bundle::{LoadedBundle, find_git_dir};
use crate::error::{BackupError, Result};
use crate::git::{VersionControlClient, redact_url};
use crate::github::{RemoteRepository, ResourceClient};
use crate::model::{IssueRecord, LabelRecord, MetadataEdit, NewIssue, RepositorySnapshot};
use crate::restore::{RestoreOptions, RestoreRunResult, RestoreSummary};
use crate::stage::{Stage, StageLog};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// Recreates labels, issues, metadata, and optionally history on a
/// destination repository.
///
/// Labels and issues are matched against what the destination already has by
/// case-insensitive name and title, so running a restore twice creates
/// nothing the second time.
pub struct RepositoryRestoreTask<'a> {
    resources: &'a dyn ResourceClient,
    vcs: &'a dyn VersionControlClient,
    options: RestoreOptions,
}

impl<'a> RepositoryRestoreTask<'a> {
    pub fn new(
        resources: &'a dyn ResourceClient,
        vcs: &'a dyn VersionControlClient,
        options: RestoreOptions,
    ) -> Self {
        Self {
            resources,
            vcs,
            options,
        }
    }

    /// Run every restore stage for `bundle` against `target`.
    pub fn run(&self, target: &RemoteRepository, bundle: &LoadedBundle) -> RestoreRunResult {
        let mut log = StageLog::new(target.name.as_str());

        if let Some(summary) = log.record(Stage::Labels, self.restore_labels(target, &bundle.labels))
            && summary.failed > 0
        {
            log.mark_failed(Stage::Labels);
        }

        if let Some(summary) = log.record(Stage::Issues, self.restore_issues(target, &bundle.issues))
            && summary.failed > 0
        {
            log.mark_failed(Stage::Issues);
        }

        log.record(Stage::Metadata, self.restore_metadata(target, &bundle.snapshot));

        if self.options.restore_history {
            log.record(Stage::History, self.restore_history(target, &bundle.dir));
        }

        log.finish()
    }

    /// Create the labels the destination does not have yet.
    pub fn restore_labels(
        &self,
        target: &RemoteRepository,
        labels: &[LabelRecord],
    ) -> Result<RestoreSummary> {
        let owner = target.owner();
        let mut existing: HashSet<String> = self
            .resources
            .fetch_labels(owner, &target.name)?
            .into_iter()
            .map(|label| label.name.to_lowercase())
            .collect();

        let mut summary = RestoreSummary::default();
        for label in labels {
            let key = label.name.to_lowercase();
            if existing.contains(&key) {
                info!(repo = %target.name, label = %label.name, "Label already exists, skipping");
                summary.skipped += 1;
                continue;
            }

            match self.resources.create_label(owner, &target.name, label) {
                Ok(()) => {
                    existing.insert(key);
                    summary.created += 1;
                }
                Err(e) => {
                    warn!(repo = %target.name, label = %label.name, error = %e,
                        "Could not create label");
                    summary.failed += 1;
                }
            }
        }

        info!(repo = %target.name, created = summary.created, skipped = summary.skipped,
            failed = summary.failed, "Labels restored");
        Ok(summary)
    }

    /// Create the issues whose titles the destination does not have yet.
    ///
    /// Issues are recreated open with their title, body, and label names.
    /// Titles are not unique, so an issue whose title matches an existing one
    /// is treated as already restored.
    pub fn restore_issues(
        &self,
        target: &RemoteRepository,
        issues: &[IssueRecord],
    ) -> Result<RestoreSummary> {
        let owner = target.owner();
        let existing: HashSet<String> = self
            .resources
            .fetch_issues(owner, &target.name)?
            .into_iter()
            .map(|issue| issue.title.to_lowercase())
            .collect();

        let mut summary = RestoreSummary::default();
        for issue in issues {
            if existing.contains(&issue.title.to_lowercase()) {
                info!(repo = %target.name, title = %issue.title, "Issue already exists, skipping");
                summary.skipped += 1;
                continue;
            }

            match self
                .resources
                .create_issue(owner, &target.name, &NewIssue::from(issue))
            {
                Ok(number) => {
                    info!(repo = %target.name, number, title = %issue.title, "Issue created");
                    summary.created += 1;
                }
                Err(e) => {
                    warn!(repo = %target.name, title = %issue.title, error = %e,
                        "Could not create issue");
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Apply the backed-up description and homepage.
    pub fn restore_metadata(
        &self,
        target: &RemoteRepository,
        snapshot: &RepositorySnapshot,
    ) -> Result<()> {
        self.resources
            .edit_metadata(target.owner(), &target.name, &MetadataEdit::from(snapshot))?;
        info!(repo = %target.name, "Repository metadata restored");
        Ok(())
    }

    /// Push the working tree cloned into `bundle_dir` to the destination.
    pub fn restore_history(&self, target: &RemoteRepository, bundle_dir: &Path) -> Result<()> {
        let source_tree = find_git_dir(bundle_dir)
            .and_then(|git_dir| git_dir.parent().map(Path::to_path_buf))
            .ok_or_else(|| BackupError::MissingHistory(bundle_dir.to_path_buf()))?;

        let branch = self.vcs.push_history(&source_tree, &target.clone_url)?;
        info!(repo = %target.name, branch = %branch, url = %redact_url(&target.clone_url),
            "History restored");
        Ok(())
    }
}
