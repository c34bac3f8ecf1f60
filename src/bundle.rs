//! On-disk layout of a repository backup bundle.
//!
//! A bundle is a directory holding exactly three JSON files plus, when history
//! was requested, a cloned working tree:
//!
//! ```text
//! {org}/
//!   organization.json
//!   {repo}/
//!     repository.json
//!     labels.json
//!     issues.json
//!     {repo}_{timestamp}/        (optional clone)
//!     {repo}_{timestamp}.zip     (optional HEAD snapshot)
//!   {repo}_{YYYY-MM-DD}.zip      (optional published artifact)
//! ```

use crate::error::{BackupError, Result};
use crate::model::{IssueRecord, LabelRecord, OrganizationManifest, RepositorySnapshot};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const REPOSITORY_FILE: &str = "repository.json";
pub const LABELS_FILE: &str = "labels.json";
pub const ISSUES_FILE: &str = "issues.json";
pub const ORGANIZATION_FILE: &str = "organization.json";

/// Files every bundle must contain for restore.
pub const REQUIRED_FILES: [&str; 3] = [REPOSITORY_FILE, LABELS_FILE, ISSUES_FILE];

/// Write a value as JSON indented with four spaces.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    value.serialize(&mut serializer)?;
    writer.flush()?;
    Ok(())
}

/// Read a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Persist the organization manifest under the organization folder.
pub fn write_manifest(manifest: &OrganizationManifest, org_dir: &Path) -> Result<PathBuf> {
    let path = org_dir.join(ORGANIZATION_FILE);
    write_json(manifest, &path)?;
    Ok(path)
}

/// A bundle directory being written by a backup.
#[derive(Debug, Clone)]
pub struct BundleWriter {
    dir: PathBuf,
}

impl BundleWriter {
    /// Create (or reuse) the bundle directory.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write_labels(&self, labels: &[LabelRecord]) -> Result<PathBuf> {
        self.write(LABELS_FILE, labels)
    }

    pub fn write_issues(&self, issues: &[IssueRecord]) -> Result<PathBuf> {
        self.write(ISSUES_FILE, issues)
    }

    pub fn write_repository(&self, snapshot: &RepositorySnapshot) -> Result<PathBuf> {
        self.write(REPOSITORY_FILE, snapshot)
    }

    fn write<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let path = self.dir.join(name);
        write_json(value, &path)?;
        Ok(path)
    }
}

/// A bundle read back for restore.
#[derive(Debug, Clone)]
pub struct LoadedBundle {
    pub dir: PathBuf,
    pub snapshot: RepositorySnapshot,
    pub labels: Vec<LabelRecord>,
    pub issues: Vec<IssueRecord>,
}

impl LoadedBundle {
    /// Load the three records of a bundle directory.
    ///
    /// Missing or malformed files are reported as [`BackupError::InvalidArchive`].
    pub fn load(dir: &Path) -> Result<Self> {
        if let Some(missing) = missing_files(dir).first() {
            return Err(BackupError::InvalidArchive {
                path: dir.to_path_buf(),
                message: format!("missing {}", missing),
            });
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            snapshot: load_record(dir, REPOSITORY_FILE)?,
            labels: load_record(dir, LABELS_FILE)?,
            issues: load_record(dir, ISSUES_FILE)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.snapshot.name
    }
}

fn load_record<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<T> {
    read_json(&dir.join(name)).map_err(|e| BackupError::InvalidArchive {
        path: dir.join(name),
        message: format!("unreadable {}: {}", name, e),
    })
}

/// Required files absent from a bundle directory.
pub fn missing_files(dir: &Path) -> Vec<&'static str> {
    REQUIRED_FILES
        .iter()
        .copied()
        .filter(|name| !dir.join(name).is_file())
        .collect()
}

/// Find every bundle directory under `root`, at any depth.
///
/// A bundle is identified by its `repository.json`. Cloned working trees
/// (directories with a `.git` child) are repository content and are skipped.
pub fn locate_bundles(root: &Path) -> Result<Vec<PathBuf>> {
    let mut bundles = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(e.file_type().is_dir() && e.path().join(".git").exists()));

    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() && entry.file_name() == REPOSITORY_FILE {
            if let Some(parent) = entry.path().parent() {
                bundles.push(parent.to_path_buf());
            }
        }
    }

    Ok(bundles)
}

/// Locate the first `.git` directory under `root`, searching recursively.
pub fn find_git_dir(root: &Path) -> Option<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .find(|e| e.file_type().is_dir() && e.file_name() == ".git")
        .map(|e| e.into_path())
}
