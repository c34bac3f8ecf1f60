//! Records written to and read from a backup.
//!
//! The JSON keys match the historical on-disk layout (`website` for the
//! homepage URL, `user` for the issue author), so older backups stay readable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Organization-level summary of a backup run, persisted as `organization.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationManifest {
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub repositories: Vec<String>,
}

impl OrganizationManifest {
    /// Create an empty manifest for an organization.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            website: None,
            location: None,
            repositories: Vec::new(),
        }
    }

    /// Record a repository whose backup completed.
    pub fn record(&mut self, repository: impl Into<String>) {
        self.repositories.push(repository.into());
    }

    /// Whether the manifest lists the given repository.
    pub fn contains(&self, repository: &str) -> bool {
        self.repositories.iter().any(|r| r == repository)
    }
}

/// Repository attributes as read from the provider, persisted as `repository.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySnapshot {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "website")]
    pub homepage: Option<String>,
    pub language: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A named, colored label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelRecord {
    pub name: String,
    pub color: String,
}

impl LabelRecord {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }
}

/// Issue state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueState::Open => write!(f, "open"),
            IssueState::Closed => write!(f, "closed"),
        }
    }
}

/// Snapshot of a single issue.
///
/// `number` is the provider's identifier at backup time. It is not preserved
/// on restore because the provider assigns a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: IssueState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(rename = "user")]
    pub author: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl IssueRecord {
    pub fn is_open(&self) -> bool {
        self.state == IssueState::Open
    }
}

/// Fields sent when creating an issue on restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub labels: Vec<String>,
}

impl From<&IssueRecord> for NewIssue {
    fn from(issue: &IssueRecord) -> Self {
        Self {
            title: issue.title.clone(),
            body: issue.body.clone(),
            labels: issue.labels.clone(),
        }
    }
}

/// The only repository attributes the provider lets a client change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataEdit {
    pub description: Option<String>,
    pub homepage: Option<String>,
}

impl From<&RepositorySnapshot> for MetadataEdit {
    fn from(snapshot: &RepositorySnapshot) -> Self {
        Self {
            description: snapshot.description.clone(),
            homepage: snapshot.homepage.clone(),
        }
    }
}
