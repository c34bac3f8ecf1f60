//! In-memory provider, version control, and publisher used by integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use org_backup::bundle::BundleWriter;
use org_backup::error::{BackupError, Result};
use org_backup::git::{VersionControlClient, WorkingTree};
use org_backup::github::{Organization, RemoteRepository, ResourceClient};
use org_backup::model::{
    IssueRecord, IssueState, LabelRecord, MetadataEdit, NewIssue, RepositorySnapshot,
};
use org_backup::publish::BlobPublisher;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

pub fn ts(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, 9, 30, 0).unwrap()
}

pub fn remote_repo(org: &str, name: &str) -> RemoteRepository {
    RemoteRepository {
        name: name.to_string(),
        full_name: format!("{}/{}", org, name),
        clone_url: format!("https://github.com/{}/{}.git", org, name),
        description: Some(format!("{} description", name)),
        homepage: Some(format!("https://{}.example.com", name)),
        language: Some("Rust".to_string()),
        created_at: Some(ts(1)),
        updated_at: Some(ts(2)),
    }
}

pub fn open_issue(number: u64, title: &str) -> IssueRecord {
    IssueRecord {
        number,
        title: title.to_string(),
        body: Some(format!("Body of {}", title)),
        state: IssueState::Open,
        created_at: ts(3),
        updated_at: ts(4),
        closed_at: None,
        author: "octocat".to_string(),
        labels: vec!["bug".to_string()],
    }
}

pub fn closed_issue(number: u64, title: &str) -> IssueRecord {
    IssueRecord {
        state: IssueState::Closed,
        closed_at: Some(ts(5)),
        labels: Vec::new(),
        ..open_issue(number, title)
    }
}

/// Write a complete bundle for `repo` under `root`.
pub fn write_bundle(
    root: &Path,
    repo: &RemoteRepository,
    labels: &[LabelRecord],
    issues: &[IssueRecord],
) -> PathBuf {
    let writer = BundleWriter::create(root.join(&repo.name)).unwrap();
    writer.write_repository(&repo.snapshot()).unwrap();
    writer.write_labels(labels).unwrap();
    writer.write_issues(issues).unwrap();
    writer.dir().to_path_buf()
}

/// Provider operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    ListRepositories,
    GetRepository,
    FetchLabels,
    FetchIssues,
    FetchMetadata,
    CreateLabel,
    CreateIssue,
    EditMetadata,
    CreateRepository,
}

/// A write the fake provider received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    Label { repo: String, name: String },
    Issue { repo: String, issue: NewIssue },
    Metadata { repo: String, edit: MetadataEdit },
    Repository { name: String },
}

#[derive(Default)]
struct State {
    repos: Vec<RemoteRepository>,
    labels: HashMap<String, Vec<LabelRecord>>,
    issues: HashMap<String, Vec<IssueRecord>>,
    writes: Vec<Write>,
}

/// In-memory [`ResourceClient`] for one organization.
pub struct FakeProvider {
    org: String,
    exists: bool,
    state: RefCell<State>,
    failures: HashSet<(String, Op)>,
}

impl FakeProvider {
    pub fn new(org: &str) -> Self {
        Self {
            org: org.to_string(),
            exists: true,
            state: RefCell::new(State::default()),
            failures: HashSet::new(),
        }
    }

    /// A provider on which the organization does not exist.
    pub fn missing(org: &str) -> Self {
        Self {
            exists: false,
            ..Self::new(org)
        }
    }

    pub fn with_repository(self, name: &str) -> Self {
        self.state.borrow_mut().repos.push(remote_repo(&self.org, name));
        self
    }

    pub fn with_labels(self, repo: &str, labels: Vec<LabelRecord>) -> Self {
        self.state.borrow_mut().labels.insert(repo.to_string(), labels);
        self
    }

    pub fn with_issues(self, repo: &str, issues: Vec<IssueRecord>) -> Self {
        self.state.borrow_mut().issues.insert(repo.to_string(), issues);
        self
    }

    /// Make `op` fail for `repo`. Organization-level operations use the
    /// organization name.
    pub fn failing(mut self, repo: &str, op: Op) -> Self {
        self.failures.insert((repo.to_string(), op));
        self
    }

    pub fn writes(&self) -> Vec<Write> {
        self.state.borrow().writes.clone()
    }

    pub fn labels(&self, repo: &str) -> Vec<LabelRecord> {
        self.state.borrow().labels.get(repo).cloned().unwrap_or_default()
    }

    pub fn issues(&self, repo: &str) -> Vec<IssueRecord> {
        self.state.borrow().issues.get(repo).cloned().unwrap_or_default()
    }

    fn check(&self, repo: &str, op: Op) -> Result<()> {
        if self.failures.contains(&(repo.to_string(), op)) {
            return Err(BackupError::GitHub {
                message: format!("injected {:?} failure for {}", op, repo),
            });
        }
        Ok(())
    }

    fn find(&self, name: &str) -> Result<RemoteRepository> {
        self.state
            .borrow()
            .repos
            .iter()
            .find(|r| r.name == name)
            .cloned()
            .ok_or_else(|| BackupError::NotFound(format!("{}/{}", self.org, name)))
    }
}

impl ResourceClient for FakeProvider {
    fn get_organization(&self, org: &str) -> Result<Organization> {
        if !self.exists || org != self.org {
            return Err(BackupError::NotFound(org.to_string()));
        }
        Ok(Organization {
            login: org.to_string(),
            description: Some("Acme Corporation".to_string()),
            blog: Some("https://acme.example.com".to_string()),
            location: Some("Springfield".to_string()),
        })
    }

    fn list_repositories(&self, org: &str) -> Result<Vec<RemoteRepository>> {
        self.check(org, Op::ListRepositories)?;
        Ok(self.state.borrow().repos.clone())
    }

    fn get_repository(&self, _owner: &str, name: &str) -> Result<RemoteRepository> {
        self.check(name, Op::GetRepository)?;
        self.find(name)
    }

    fn fetch_labels(&self, _owner: &str, repo: &str) -> Result<Vec<LabelRecord>> {
        self.check(repo, Op::FetchLabels)?;
        Ok(self.labels(repo))
    }

    fn fetch_issues(&self, _owner: &str, repo: &str) -> Result<Vec<IssueRecord>> {
        self.check(repo, Op::FetchIssues)?;
        Ok(self.issues(repo))
    }

    fn fetch_metadata(&self, _owner: &str, repo: &str) -> Result<RepositorySnapshot> {
        self.check(repo, Op::FetchMetadata)?;
        Ok(self.find(repo)?.snapshot())
    }

    fn create_label(&self, _owner: &str, repo: &str, label: &LabelRecord) -> Result<()> {
        self.check(repo, Op::CreateLabel)?;
        let mut state = self.state.borrow_mut();
        state
            .labels
            .entry(repo.to_string())
            .or_default()
            .push(label.clone());
        state.writes.push(Write::Label {
            repo: repo.to_string(),
            name: label.name.clone(),
        });
        Ok(())
    }

    fn create_issue(&self, _owner: &str, repo: &str, issue: &NewIssue) -> Result<u64> {
        self.check(repo, Op::CreateIssue)?;
        let mut state = self.state.borrow_mut();
        let issues = state.issues.entry(repo.to_string()).or_default();
        let number = issues.len() as u64 + 1;
        issues.push(IssueRecord {
            body: issue.body.clone(),
            labels: issue.labels.clone(),
            ..open_issue(number, &issue.title)
        });
        state.writes.push(Write::Issue {
            repo: repo.to_string(),
            issue: issue.clone(),
        });
        Ok(number)
    }

    fn edit_metadata(&self, _owner: &str, repo: &str, edit: &MetadataEdit) -> Result<()> {
        self.check(repo, Op::EditMetadata)?;
        let mut state = self.state.borrow_mut();
        if let Some(existing) = state.repos.iter_mut().find(|r| r.name == repo) {
            existing.description = edit.description.clone();
            existing.homepage = edit.homepage.clone();
        }
        state.writes.push(Write::Metadata {
            repo: repo.to_string(),
            edit: edit.clone(),
        });
        Ok(())
    }

    fn create_repository(
        &self,
        org: &str,
        snapshot: &RepositorySnapshot,
    ) -> Result<RemoteRepository> {
        self.check(&snapshot.name, Op::CreateRepository)?;
        let repository = RemoteRepository {
            description: snapshot.description.clone(),
            homepage: snapshot.homepage.clone(),
            ..remote_repo(org, &snapshot.name)
        };
        let mut state = self.state.borrow_mut();
        state.repos.push(repository.clone());
        state.writes.push(Write::Repository {
            name: snapshot.name.clone(),
        });
        Ok(repository)
    }
}

/// Version control that writes a fake working tree instead of cloning.
#[derive(Default)]
pub struct FakeVcs {
    failing_urls: HashSet<String>,
    pushes: RefCell<Vec<(PathBuf, String)>>,
}

impl FakeVcs {
    /// Make clones of `url` fail after writing part of the working tree.
    pub fn failing_clone(mut self, url: &str) -> Self {
        self.failing_urls.insert(url.to_string());
        self
    }

    /// `(source tree, remote url)` of every push.
    pub fn pushes(&self) -> Vec<(PathBuf, String)> {
        self.pushes.borrow().clone()
    }
}

impl VersionControlClient for FakeVcs {
    fn clone_all(&self, remote_url: &str, destination: &Path) -> Result<WorkingTree> {
        fs::create_dir_all(destination.join(".git"))?;
        if self.failing_urls.contains(remote_url) {
            return Err(BackupError::CloneFailed {
                repo: remote_url.to_string(),
                message: "connection reset".to_string(),
            });
        }
        fs::write(destination.join("README.md"), "# cloned\n")?;
        Ok(WorkingTree::new(destination))
    }

    fn snapshot_as_archive(
        &self,
        _tree: &WorkingTree,
        output: &Path,
        _reference: &str,
    ) -> Result<PathBuf> {
        fs::write(output, b"PK\x05\x06")?;
        Ok(output.to_path_buf())
    }

    fn push_history(&self, source_tree: &Path, remote_url: &str) -> Result<String> {
        self.pushes
            .borrow_mut()
            .push((source_tree.to_path_buf(), remote_url.to_string()));
        Ok("main".to_string())
    }
}

/// Publisher that records blob names and can reject some of them.
#[derive(Default)]
pub struct RecordingPublisher {
    rejected: HashSet<String>,
    uploads: RefCell<Vec<String>>,
}

impl RecordingPublisher {
    pub fn rejecting(mut self, blob_name: &str) -> Self {
        self.rejected.insert(blob_name.to_string());
        self
    }

    pub fn uploads(&self) -> Vec<String> {
        self.uploads.borrow().clone()
    }
}

impl BlobPublisher for RecordingPublisher {
    fn upload(&self, artifact: &Path, blob_name: &str) -> Result<()> {
        if self.rejected.contains(blob_name) {
            return Err(BackupError::Publish {
                artifact: artifact.to_path_buf(),
                message: "403 Forbidden".to_string(),
            });
        }
        assert!(artifact.is_file(), "uploading missing {}", artifact.display());
        self.uploads.borrow_mut().push(blob_name.to_string());
        Ok(())
    }
}
