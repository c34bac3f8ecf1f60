//! Error types for backup and restore operations.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for backup and restore operations.
#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Organization '{org}' could not be resolved: {message}")]
    OrganizationNotFound { org: String, message: String },

    #[error("Repositories of '{org}' could not be listed: {message}")]
    EnumerationFailed { org: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("GitHub API error: {message}")]
    GitHub { message: String },

    #[error("Clone failed for {repo}: {message}")]
    CloneFailed { repo: String, message: String },

    #[error("Push failed: {message}")]
    PushError { message: String },

    #[error("Invalid archive {path}: {message}")]
    InvalidArchive { path: PathBuf, message: String },

    #[error("No version-control history found under {0}")]
    MissingHistory(PathBuf),

    #[error("Publish failed for {artifact}: {message}")]
    Publish { artifact: PathBuf, message: String },
}

impl BackupError {
    /// Whether this error reports a missing remote resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackupError::NotFound(_))
    }
}

/// A specialized Result type for backup and restore operations.
pub type Result<T> = std::result::Result<T, BackupError>;
