//! Restore of every bundle found in a backup archive.

use crate::archive::Archiver;
use crate::bundle::{LoadedBundle, REPOSITORY_FILE, locate_bundles};
use crate::error::{BackupError, Result};
use crate::git::VersionControlClient;
use crate::github::{RemoteRepository, ResourceClient};
use crate::model::RepositorySnapshot;
use crate::restore::{
    RepoRestoreResult, RepositoryRestoreTask, RestoreOptions, RestoreResult,
};
use crate::stage::RunResult;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

const SCRATCH_PREFIX: &str = "org-backup-restore-";

/// Unpacks an archive, validates its bundles, and restores each into the
/// organization.
pub struct OrganizationRestoreOrchestrator<'a> {
    resources: &'a dyn ResourceClient,
    vcs: &'a dyn VersionControlClient,
    archiver: &'a dyn Archiver,
    scratch_root: Option<PathBuf>,
    options: RestoreOptions,
}

impl<'a> OrganizationRestoreOrchestrator<'a> {
    pub fn new(
        resources: &'a dyn ResourceClient,
        vcs: &'a dyn VersionControlClient,
        archiver: &'a dyn Archiver,
        options: RestoreOptions,
    ) -> Self {
        Self {
            resources,
            vcs,
            archiver,
            scratch_root: None,
            options,
        }
    }

    /// Parent directory for the per-run scratch directory. Defaults to the
    /// system temp directory.
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    /// Restore `archive` into `organization`.
    ///
    /// Every bundle is validated before anything is written to the provider.
    /// An incomplete bundle is reported as a fatal result for that repository
    /// and the others are still restored. The run fails with
    /// [`BackupError::InvalidArchive`] when no bundle in the archive is valid.
    pub fn run(&self, organization: &str, archive: &Path) -> Result<RestoreResult> {
        let scratch = match &self.scratch_root {
            Some(root) => {
                fs::create_dir_all(root)?;
                tempfile::Builder::new().prefix(SCRATCH_PREFIX).tempdir_in(root)?
            }
            None => tempfile::Builder::new().prefix(SCRATCH_PREFIX).tempdir()?,
        };
        debug!(path = %scratch.path().display(), "Created scratch directory");

        self.archiver.unpack(archive, scratch.path())?;
        let bundles = load_bundles(archive, scratch.path())?;
        info!(org = organization, count = bundles.len(), "Archive validated");

        let task = RepositoryRestoreTask::new(self.resources, self.vcs, self.options);
        let mut restored = Vec::new();
        let mut repo_results = Vec::new();

        for candidate in bundles {
            let (name, status) = match candidate.bundle {
                Ok(bundle) => {
                    info!(org = organization, repo = %bundle.name(), "Restoring repository");
                    let status = match self.resolve_destination(organization, &bundle.snapshot) {
                        Ok(target) => task.run(&target, &bundle),
                        Err(e) => RunResult::Fatal(e),
                    };
                    (bundle.name().to_string(), status)
                }
                Err(e) => (candidate.name, RunResult::Fatal(e)),
            };

            match &status {
                RunResult::Fatal(e) => {
                    error!(repo = %name, error = %e, "Repository restore failed");
                }
                RunResult::PartialFailure(stages) => {
                    let stages: Vec<_> = stages.iter().map(|s| s.name()).collect();
                    warn!(repo = %name, failed_stages = ?stages,
                        "Repository restored with failures");
                    restored.push(name.clone());
                }
                RunResult::Success => restored.push(name.clone()),
            }

            repo_results.push(RepoRestoreResult {
                name,
                bundle: candidate.dir,
                status,
            });
        }

        if let Err(e) = scratch.close() {
            warn!(error = %e, "Could not remove scratch directory");
        }

        info!(org = organization, restored = restored.len(), total = repo_results.len(),
            "Restore finished");
        Ok(RestoreResult {
            restored,
            repo_results,
        })
    }

    /// Find the destination repository, creating it when it does not exist.
    fn resolve_destination(
        &self,
        organization: &str,
        snapshot: &RepositorySnapshot,
    ) -> Result<RemoteRepository> {
        match self.resources.get_repository(organization, &snapshot.name) {
            Ok(repository) => Ok(repository),
            Err(e) if e.is_not_found() => {
                info!(org = organization, repo = %snapshot.name, "Creating repository");
                self.resources.create_repository(organization, snapshot)
            }
            Err(e) => Err(e),
        }
    }
}

/// A bundle directory found in the archive, loaded or rejected.
struct Candidate {
    name: String,
    dir: PathBuf,
    bundle: Result<LoadedBundle>,
}

/// Load and validate every bundle under `root`.
///
/// Fails when there is no bundle, or when none of them is valid.
fn load_bundles(archive: &Path, root: &Path) -> Result<Vec<Candidate>> {
    let dirs = locate_bundles(root)?;
    if dirs.is_empty() {
        return Err(BackupError::InvalidArchive {
            path: archive.to_path_buf(),
            message: format!("no {} found", REPOSITORY_FILE),
        });
    }

    let mut candidates: Vec<Candidate> = dirs
        .into_iter()
        .map(|dir| {
            let bundle = LoadedBundle::load(&dir).map_err(|e| match e {
                BackupError::InvalidArchive { path, message } => BackupError::InvalidArchive {
                    path: archive.to_path_buf(),
                    message: format!("{}: {}", display_relative(&path, root), message),
                },
                other => other,
            });
            let name = match &bundle {
                Ok(bundle) => bundle.name().to_string(),
                Err(_) => dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| display_relative(&dir, root)),
            };
            Candidate { name, dir, bundle }
        })
        .collect();

    if candidates.iter().all(|c| c.bundle.is_err()) {
        let first = candidates.remove(0);
        return Err(match first.bundle {
            Err(e) => e,
            Ok(_) => BackupError::InvalidArchive {
                path: archive.to_path_buf(),
                message: "no valid bundle".into(),
            },
        });
    }

    Ok(candidates)
}

fn display_relative(path: &Path, root: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(relative) if relative.as_os_str().is_empty() => ".".to_string(),
        Ok(relative) => relative.display().to_string(),
        Err(_) => path.display().to_string(),
    }
}
