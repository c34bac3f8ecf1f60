//! git2-backed [`VersionControlClient`].

use crate::error::{BackupError, Result};
use crate::git::push::remote_callbacks;
use crate::git::{
    BranchOps, CommitOps, GitAuth, GitOps, PushOps, VersionControlClient, WorkingTree,
    authenticated_url, redact_url,
};
use git2::build::RepoBuilder;
use git2::{FetchOptions, ObjectType, Repository, TreeWalkMode, TreeWalkResult};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

const DEFAULT_BRANCH: &str = "main";
const RESTORE_COMMIT_MESSAGE: &str = "Restore repository content from backup";

/// Version-control client backed by libgit2.
#[derive(Debug, Clone, Default)]
pub struct GitClient {
    auth: GitAuth,
}

impl GitClient {
    pub fn new(auth: GitAuth) -> Self {
        Self { auth }
    }

    /// The URL handed to libgit2, with the token embedded when configured.
    fn resolved_url(&self, remote_url: &str) -> String {
        match self.auth.token_value() {
            Some(token) => authenticated_url(remote_url, token),
            None => remote_url.to_string(),
        }
    }
}

impl VersionControlClient for GitClient {
    fn clone_all(&self, remote_url: &str, destination: &Path) -> Result<WorkingTree> {
        info!(url = %redact_url(remote_url), path = %destination.display(), "Cloning repository");

        let clone_failed = |message: String| BackupError::CloneFailed {
            repo: redact_url(remote_url),
            message: self.auth.scrub(&message),
        };

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(remote_callbacks(&self.auth));

        // The default refspec fetches every branch, not only the default one
        let repo = RepoBuilder::new()
            .fetch_options(fetch_options)
            .clone(&self.resolved_url(remote_url), destination)
            .map_err(|e| clone_failed(e.message().to_string()))?;

        // Keep the token out of the cloned .git/config
        repo.remote_set_url("origin", remote_url)
            .map_err(|e| clone_failed(e.message().to_string()))?;

        let git = GitOps { repo, auth: GitAuth::None };
        match git.remote_branches() {
            Ok(branches) => debug!(count = branches.len(), "Fetched remote branches"),
            Err(e) => debug!(error = %e, "Could not list remote branches"),
        }

        let has_files = fs::read_dir(destination)?
            .filter_map(|e| e.ok())
            .any(|e| e.file_name() != ".git");
        if !has_files {
            warn!(path = %destination.display(), "Cloned working tree is empty");
        }

        Ok(WorkingTree::new(destination))
    }

    fn snapshot_as_archive(
        &self,
        tree: &WorkingTree,
        output: &Path,
        reference: &str,
    ) -> Result<PathBuf> {
        let repo = Repository::open(&tree.path)?;

        if let Err(e) = write_snapshot(&repo, output, reference) {
            if output.exists() {
                let _ = fs::remove_file(output);
            }
            return Err(e);
        }

        info!(path = %output.display(), reference, "Snapshot archive created");
        Ok(output.to_path_buf())
    }

    fn push_history(&self, source_tree: &Path, remote_url: &str) -> Result<String> {
        let branch = GitOps::open(source_tree)
            .and_then(|git| git.current_branch())
            .unwrap_or_else(|_| DEFAULT_BRANCH.to_string());

        let scratch = tempfile::Builder::new().prefix("history-").tempdir()?;
        copy_working_tree(source_tree, scratch.path())?;

        let git = GitOps::init(scratch.path(), &branch)?.with_auth(self.auth.clone());
        git.stage_all()?;
        git.commit(RESTORE_COMMIT_MESSAGE)?;
        git.add_remote("origin", remote_url)?;

        info!(url = %redact_url(remote_url), branch = %branch, "Pushing restored history");
        git.push("origin", &branch)?;

        Ok(branch)
    }
}

/// Write every blob reachable from `reference` into a zip.
fn write_snapshot(repo: &Repository, output: &Path, reference: &str) -> Result<()> {
    let tree = repo.revparse_single(reference)?.peel_to_tree()?;

    let mut entries = Vec::new();
    tree.walk(TreeWalkMode::PreOrder, |root, entry| {
        if entry.kind() == Some(ObjectType::Blob)
            && let Some(name) = entry.name()
        {
            entries.push((format!("{}{}", root, name), entry.id(), entry.filemode()));
        }
        TreeWalkResult::Ok
    })?;

    let mut zip = zip::ZipWriter::new(File::create(output)?);
    for (path, oid, mode) in entries {
        let permissions = if mode == 0o100755 { 0o755 } else { 0o644 };
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(permissions);

        let blob = repo.find_blob(oid)?;
        zip.start_file(path, options)?;
        zip.write_all(blob.content())?;
    }
    zip.finish()?;

    Ok(())
}

/// Copy the files of a working tree, leaving its `.git` directory behind.
fn copy_working_tree(source: &Path, target: &Path) -> Result<()> {
    let walker = WalkDir::new(source)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let destination = target.join(relative);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &destination)?;
    }

    Ok(())
}
