//! Backup of a single repository into its bundle folder.

use crate::archive::{Archiver, dated_artifact_path};
use crate::backup::{BackupOptions, BackupRunResult};
use crate::bundle::BundleWriter;
use crate::error::{BackupError, Result};
use crate::git::VersionControlClient;
use crate::github::{RemoteRepository, ResourceClient};
use crate::publish::{BlobPublisher, blob_name, collect_artifacts};
use crate::stage::{RunResult, Stage, StageLog};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

const HISTORY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Name of the folder a clone is written to: `{repo}_{YYYY-MM-DD_HH-MM-SS}`.
pub fn history_folder_name(repo: &str, at: DateTime<Local>) -> String {
    format!("{}_{}", repo, at.format(HISTORY_TIMESTAMP_FORMAT))
}

/// Runs the backup stages for one repository.
///
/// Stages are isolated from each other: a failure is logged, recorded in the
/// returned [`BackupRunResult`], and the remaining stages still run.
pub struct RepositoryBackupTask<'a> {
    resources: &'a dyn ResourceClient,
    vcs: &'a dyn VersionControlClient,
    archiver: &'a dyn Archiver,
    publisher: Option<&'a dyn BlobPublisher>,
    options: BackupOptions,
}

impl<'a> RepositoryBackupTask<'a> {
    pub fn new(
        resources: &'a dyn ResourceClient,
        vcs: &'a dyn VersionControlClient,
        archiver: &'a dyn Archiver,
        options: BackupOptions,
    ) -> Self {
        Self {
            resources,
            vcs,
            archiver,
            publisher: None,
            options,
        }
    }

    /// Set the sink used by the publish stage.
    pub fn with_publisher(mut self, publisher: Option<&'a dyn BlobPublisher>) -> Self {
        self.publisher = publisher;
        self
    }

    /// Back up `repository` into `destination`.
    ///
    /// Only a failure to create `destination` is fatal.
    pub fn run(&self, repository: &RemoteRepository, destination: &Path) -> BackupRunResult {
        let bundle = match BundleWriter::create(destination) {
            Ok(bundle) => bundle,
            Err(e) => {
                error!(repo = %repository.name, path = %destination.display(), error = %e,
                    "Cannot create repository folder");
                return RunResult::Fatal(e);
            }
        };

        let owner = repository.owner();
        let name = repository.name.as_str();
        let mut log = StageLog::new(name);

        if self.options.include_labels {
            log.record(Stage::Labels, self.backup_labels(owner, name, &bundle));
        }
        if self.options.include_issues {
            log.record(Stage::Issues, self.backup_issues(owner, name, &bundle));
        }
        log.record(Stage::Metadata, self.backup_metadata(owner, name, &bundle));

        if self.options.clone_history {
            log.record(Stage::History, self.backup_history(repository, &bundle));
        }

        if self.options.publish
            && let Some(artifact) = log.record(Stage::Archive, self.archive(&bundle))
        {
            log.record(Stage::Publish, self.publish(owner, &bundle, &artifact));
        }

        log.finish()
    }

    fn backup_labels(&self, owner: &str, repo: &str, bundle: &BundleWriter) -> Result<()> {
        let labels = self.resources.fetch_labels(owner, repo)?;
        let path = bundle.write_labels(&labels)?;
        info!(repo, count = labels.len(), path = %path.display(), "Labels saved");
        Ok(())
    }

    fn backup_issues(&self, owner: &str, repo: &str, bundle: &BundleWriter) -> Result<()> {
        let issues = self.resources.fetch_issues(owner, repo)?;
        let path = bundle.write_issues(&issues)?;
        info!(repo, count = issues.len(), path = %path.display(), "Issues saved");
        Ok(())
    }

    fn backup_metadata(&self, owner: &str, repo: &str, bundle: &BundleWriter) -> Result<()> {
        let snapshot = self.resources.fetch_metadata(owner, repo)?;
        let path = bundle.write_repository(&snapshot)?;
        info!(repo, path = %path.display(), "Repository metadata saved");
        Ok(())
    }

    fn backup_history(&self, repository: &RemoteRepository, bundle: &BundleWriter) -> Result<()> {
        let folder = history_folder_name(&repository.name, Local::now());
        let clone_dir = bundle.dir().join(&folder);

        let tree = match self.vcs.clone_all(&repository.clone_url, &clone_dir) {
            Ok(tree) => tree,
            Err(e) => {
                if clone_dir.exists()
                    && let Err(cleanup) = fs::remove_dir_all(&clone_dir)
                {
                    warn!(path = %clone_dir.display(), error = %cleanup,
                        "Could not remove partial clone");
                }
                return Err(e);
            }
        };

        let snapshot = bundle.dir().join(format!("{}.zip", folder));
        self.vcs.snapshot_as_archive(&tree, &snapshot, "HEAD")?;
        Ok(())
    }

    fn archive(&self, bundle: &BundleWriter) -> Result<PathBuf> {
        let artifact = dated_artifact_path(bundle.dir());
        self.archiver.pack(bundle.dir(), &artifact)?;
        debug!(path = %artifact.display(), "Repository folder archived");
        Ok(artifact)
    }

    /// Upload the selected artifacts. Every artifact is attempted; the stage
    /// fails if any upload did.
    fn publish(&self, owner: &str, bundle: &BundleWriter, latest: &Path) -> Result<()> {
        let publisher = self.publisher.ok_or_else(|| {
            BackupError::InvalidConfig("publishing requested but no blob publisher configured".into())
        })?;

        let artifacts = collect_artifacts(bundle.dir(), latest, self.options.publish_scope)?;
        let total = artifacts.len();
        let mut first_failure: Option<(PathBuf, BackupError)> = None;
        let mut failures = 0;

        for artifact in artifacts {
            match publisher.upload(&artifact.path, &blob_name(owner, &artifact.path)) {
                Ok(()) => {
                    if artifact.remove_after_upload
                        && let Err(e) = fs::remove_file(&artifact.path)
                    {
                        warn!(path = %artifact.path.display(), error = %e,
                            "Could not remove uploaded artifact");
                    }
                }
                Err(e) => {
                    warn!(path = %artifact.path.display(), error = %e, "Upload failed");
                    failures += 1;
                    if first_failure.is_none() {
                        first_failure = Some((artifact.path, e));
                    }
                }
            }
        }

        match first_failure {
            None => Ok(()),
            Some((artifact, e)) => Err(BackupError::Publish {
                artifact,
                message: format!("{} of {} uploads failed, first: {}", failures, total, e),
            }),
        }
    }
}
