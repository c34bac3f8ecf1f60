//! Backup of every selected repository in an organization.

use crate::archive::Archiver;
use crate::backup::{
    BackupOptions, BackupResult, BackupSummary, RepoBackupResult, RepositoryBackupTask,
};
use crate::bundle::write_manifest;
use crate::error::{BackupError, Result};
use crate::git::VersionControlClient;
use crate::github::ResourceClient;
use crate::model::OrganizationManifest;
use crate::publish::BlobPublisher;
use crate::stage::RunResult;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Drives [`RepositoryBackupTask`] across an organization and writes the
/// manifest.
pub struct OrganizationBackupOrchestrator<'a> {
    output_dir: PathBuf,
    resources: &'a dyn ResourceClient,
    vcs: &'a dyn VersionControlClient,
    archiver: &'a dyn Archiver,
    publisher: Option<&'a dyn BlobPublisher>,
}

impl<'a> OrganizationBackupOrchestrator<'a> {
    /// Bundles are written under `{output_dir}/{organization}`.
    pub fn new(
        output_dir: impl Into<PathBuf>,
        resources: &'a dyn ResourceClient,
        vcs: &'a dyn VersionControlClient,
        archiver: &'a dyn Archiver,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            resources,
            vcs,
            archiver,
            publisher: None,
        }
    }

    pub fn with_publisher(mut self, publisher: &'a dyn BlobPublisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Back up the repositories of `organization`.
    ///
    /// An empty `selection` backs up every repository. Only failing to
    /// resolve the organization or list its repositories is an error;
    /// per-repository failures are reported in the result.
    pub fn run(
        &self,
        organization: &str,
        selection: &[String],
        options: &BackupOptions,
    ) -> Result<BackupResult> {
        let profile = self.resources.get_organization(organization).map_err(|e| {
            BackupError::OrganizationNotFound {
                org: organization.to_string(),
                message: e.to_string(),
            }
        })?;

        let repositories = self.resources.list_repositories(organization).map_err(|e| {
            BackupError::EnumerationFailed {
                org: organization.to_string(),
                message: e.to_string(),
            }
        })?;
        info!(org = organization, count = repositories.len(), "Repositories enumerated");

        for wanted in selection {
            if !repositories.iter().any(|r| &r.name == wanted) {
                warn!(org = organization, repo = %wanted, "Selected repository not found");
            }
        }

        let org_dir = self.output_dir.join(organization);
        fs::create_dir_all(&org_dir)?;

        let mut manifest = OrganizationManifest {
            description: profile.description,
            website: profile.blog.filter(|blog| !blog.is_empty()),
            location: profile.location,
            ..OrganizationManifest::new(organization)
        };

        let task = RepositoryBackupTask::new(self.resources, self.vcs, self.archiver, *options)
            .with_publisher(self.publisher);

        let mut repo_results = Vec::new();
        let mut summary = BackupSummary::default();

        for repository in repositories
            .iter()
            .filter(|r| selection.is_empty() || selection.contains(&r.name))
        {
            info!(org = organization, repo = %repository.name, "Backing up repository");

            let path = org_dir.join(&repository.name);
            let status = task.run(repository, &path);
            summary.total_repos += 1;

            match &status {
                RunResult::Success => {
                    summary.succeeded += 1;
                    manifest.record(&repository.name);
                }
                RunResult::PartialFailure(stages) => {
                    summary.partial += 1;
                    manifest.record(&repository.name);
                    let stages: Vec<_> = stages.iter().map(|s| s.name()).collect();
                    warn!(repo = %repository.name, failed_stages = ?stages,
                        "Repository backed up with failures");
                }
                RunResult::Fatal(e) => {
                    summary.failed += 1;
                    error!(repo = %repository.name, error = %e, "Repository backup failed");
                }
            }

            repo_results.push(RepoBackupResult {
                name: repository.name.clone(),
                path,
                status,
            });
        }

        let manifest_path = write_manifest(&manifest, &org_dir)?;
        info!(
            org = organization,
            succeeded = summary.succeeded,
            partial = summary.partial,
            failed = summary.failed,
            path = %manifest_path.display(),
            "Backup finished"
        );

        Ok(BackupResult {
            manifest,
            manifest_path,
            repo_results,
            summary,
        })
    }
}
