//! Wire types returned by the GitHub REST API and their conversions.

use crate::model::{IssueRecord, IssueState, LabelRecord, RepositorySnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Organization profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Organization {
    pub login: String,
    pub description: Option<String>,
    /// The organization's website.
    pub blog: Option<String>,
    pub location: Option<String>,
}

/// Repository information from GitHub API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteRepository {
    pub name: String,
    pub full_name: String,
    pub clone_url: String,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub language: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl RemoteRepository {
    /// Owner part of `full_name`.
    pub fn owner(&self) -> &str {
        self.full_name
            .split_once('/')
            .map(|(owner, _)| owner)
            .unwrap_or(&self.full_name)
    }

    /// Attributes written to `repository.json`.
    ///
    /// Timestamps missing from the response fall back to the Unix epoch.
    pub fn snapshot(&self) -> RepositorySnapshot {
        RepositorySnapshot {
            name: self.name.clone(),
            description: self.description.clone(),
            homepage: self.homepage.clone(),
            language: self.language.clone(),
            created_at: self.created_at.unwrap_or_default(),
            updated_at: self.updated_at.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiLabel {
    pub name: String,
    pub color: String,
}

impl From<ApiLabel> for LabelRecord {
    fn from(label: ApiLabel) -> Self {
        LabelRecord::new(label.name, label.color)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiUser {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiIssueLabel {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiIssue {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: IssueState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub user: Option<ApiUser>,
    #[serde(default)]
    pub labels: Vec<ApiIssueLabel>,
    /// Present when the entry is a pull request.
    pub pull_request: Option<serde_json::Value>,
}

impl ApiIssue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

impl From<ApiIssue> for IssueRecord {
    fn from(issue: ApiIssue) -> Self {
        // An open issue never carries a close time, even if a reopened
        // issue still reports the previous one.
        let closed_at = match issue.state {
            IssueState::Open => None,
            IssueState::Closed => issue.closed_at,
        };

        IssueRecord {
            number: issue.number,
            title: issue.title,
            body: issue.body,
            state: issue.state,
            created_at: issue.created_at,
            updated_at: issue.updated_at,
            closed_at,
            author: issue.user.map(|u| u.login).unwrap_or_else(|| "ghost".into()),
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}

/// Request body for creating a repository in an organization.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateRepository<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub homepage: Option<&'a str>,
    pub private: bool,
}
