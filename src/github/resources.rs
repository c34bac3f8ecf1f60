//! Read/write access to an organization's repositories, labels, and issues.

use crate::error::Result;
use crate::github::GitHubClient;
use crate::github::types::{ApiIssue, ApiLabel, CreateRepository, Organization, RemoteRepository};
use crate::model::{IssueRecord, LabelRecord, MetadataEdit, NewIssue, RepositorySnapshot};
use serde::de::IgnoredAny;

/// Capabilities the backup and restore pipeline needs from a provider.
///
/// Every method is a single remote call (or one paginated listing). Nothing
/// retries: a failure is returned to the caller, which decides whether it is
/// fatal or confined to one stage.
pub trait ResourceClient {
    /// Resolve an organization's profile.
    fn get_organization(&self, org: &str) -> Result<Organization>;

    /// List the organization's repositories in provider order.
    fn list_repositories(&self, org: &str) -> Result<Vec<RemoteRepository>>;

    /// Look up a single repository.
    fn get_repository(&self, owner: &str, name: &str) -> Result<RemoteRepository>;

    /// Fetch every label of a repository.
    fn fetch_labels(&self, owner: &str, repo: &str) -> Result<Vec<LabelRecord>>;

    /// Fetch every issue, open and closed, in provider order.
    fn fetch_issues(&self, owner: &str, repo: &str) -> Result<Vec<IssueRecord>>;

    /// Fetch repository attributes.
    fn fetch_metadata(&self, owner: &str, repo: &str) -> Result<RepositorySnapshot>;

    fn create_label(&self, owner: &str, repo: &str, label: &LabelRecord) -> Result<()>;

    /// Create an issue, returning the number the provider assigned.
    fn create_issue(&self, owner: &str, repo: &str, issue: &NewIssue) -> Result<u64>;

    /// Update the editable repository attributes.
    fn edit_metadata(&self, owner: &str, repo: &str, edit: &MetadataEdit) -> Result<()>;

    /// Create a repository in the organization.
    fn create_repository(&self, org: &str, snapshot: &RepositorySnapshot)
    -> Result<RemoteRepository>;
}

impl ResourceClient for GitHubClient {
    fn get_organization(&self, org: &str) -> Result<Organization> {
        self.get(&format!("/orgs/{}", org))
    }

    fn list_repositories(&self, org: &str) -> Result<Vec<RemoteRepository>> {
        self.get_paginated(&format!("/orgs/{}/repos?type=all", org))
    }

    fn get_repository(&self, owner: &str, name: &str) -> Result<RemoteRepository> {
        self.get(&format!("/repos/{}/{}", owner, name))
    }

    fn fetch_labels(&self, owner: &str, repo: &str) -> Result<Vec<LabelRecord>> {
        let labels: Vec<ApiLabel> =
            self.get_paginated(&format!("/repos/{}/{}/labels", owner, repo))?;
        Ok(labels.into_iter().map(LabelRecord::from).collect())
    }

    fn fetch_issues(&self, owner: &str, repo: &str) -> Result<Vec<IssueRecord>> {
        let issues: Vec<ApiIssue> =
            self.get_paginated(&format!("/repos/{}/{}/issues?state=all", owner, repo))?;
        Ok(issues
            .into_iter()
            .filter(|issue| !issue.is_pull_request())
            .map(IssueRecord::from)
            .collect())
    }

    fn fetch_metadata(&self, owner: &str, repo: &str) -> Result<RepositorySnapshot> {
        Ok(self.get_repository(owner, repo)?.snapshot())
    }

    fn create_label(&self, owner: &str, repo: &str, label: &LabelRecord) -> Result<()> {
        let _: IgnoredAny = self.post(&format!("/repos/{}/{}/labels", owner, repo), label)?;
        Ok(())
    }

    fn create_issue(&self, owner: &str, repo: &str, issue: &NewIssue) -> Result<u64> {
        #[derive(serde::Deserialize)]
        struct Created {
            number: u64,
        }

        let created: Created = self.post(&format!("/repos/{}/{}/issues", owner, repo), issue)?;
        Ok(created.number)
    }

    fn edit_metadata(&self, owner: &str, repo: &str, edit: &MetadataEdit) -> Result<()> {
        let _: IgnoredAny = self.patch(&format!("/repos/{}/{}", owner, repo), edit)?;
        Ok(())
    }

    fn create_repository(
        &self,
        org: &str,
        snapshot: &RepositorySnapshot,
    ) -> Result<RemoteRepository> {
        let body = CreateRepository {
            name: &snapshot.name,
            description: snapshot.description.as_deref(),
            homepage: snapshot.homepage.as_deref(),
            private: true,
        };
        self.post(&format!("/orgs/{}/repos", org), &body)
    }
}
