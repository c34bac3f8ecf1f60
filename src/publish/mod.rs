//! Uploading backup artifacts to remote blob storage.

mod azure;

pub use azure::AzureBlobPublisher;

use crate::archive::is_dated_artifact;
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Write-only sink for backup artifacts.
pub trait BlobPublisher {
    /// Upload `artifact` under `blob_name`.
    fn upload(&self, artifact: &Path, blob_name: &str) -> Result<()>;
}

/// Which artifacts the publish stage uploads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PublishScope {
    /// Every `*.zip` under the repository folder plus every dated artifact of
    /// the repository beside it, so artifacts left by earlier failed uploads
    /// are sent again.
    #[default]
    AllArchives,
    /// Only the artifact created by this run.
    LatestOnly,
}

/// An artifact selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingArtifact {
    pub path: PathBuf,
    /// Dated artifacts are transport copies and are removed once uploaded.
    pub remove_after_upload: bool,
}

/// Select the artifacts to upload for one repository.
///
/// `repo_dir` is the repository's bundle folder and `latest` the dated
/// artifact just created beside it. The result is sorted by path, with no
/// duplicates, and always contains `latest` when it exists.
pub fn collect_artifacts(
    repo_dir: &Path,
    latest: &Path,
    scope: PublishScope,
) -> Result<Vec<PendingArtifact>> {
    let mut artifacts = Vec::new();

    if latest.is_file() {
        artifacts.push(PendingArtifact {
            path: latest.to_path_buf(),
            remove_after_upload: true,
        });
    }

    if scope == PublishScope::LatestOnly {
        return Ok(artifacts);
    }

    if repo_dir.is_dir() {
        for entry in WalkDir::new(repo_dir) {
            let entry = entry?;
            if entry.file_type().is_file() && has_zip_extension(entry.path()) {
                artifacts.push(PendingArtifact {
                    path: entry.into_path(),
                    remove_after_upload: false,
                });
            }
        }
    }

    let repo_name = repo_dir.file_name().and_then(|n| n.to_str());
    if let (Some(parent), Some(repo_name)) = (repo_dir.parent(), repo_name) {
        for entry in fs::read_dir(parent)? {
            let entry = entry?;
            let path = entry.path();
            let is_stale = path.is_file()
                && path != latest
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| is_dated_artifact(name, repo_name));
            if is_stale {
                artifacts.push(PendingArtifact {
                    path,
                    remove_after_upload: true,
                });
            }
        }
    }

    artifacts.sort_by(|a, b| a.path.cmp(&b.path));
    artifacts.dedup_by(|a, b| a.path == b.path);
    Ok(artifacts)
}

/// Blob name for an artifact: `{organization}/{file name}`.
pub fn blob_name(organization: &str, artifact: &Path) -> String {
    let file_name = artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}/{}", organization, file_name)
}

fn has_zip_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}
