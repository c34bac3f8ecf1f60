//! Integration tests for organization backup.

mod common;

use common::{FakeProvider, FakeVcs, Op, RecordingPublisher, closed_issue, open_issue};
use org_backup::archive::{ZipArchiver, dated_artifact_path};
use org_backup::backup::{BackupOptions, OrganizationBackupOrchestrator};
use org_backup::bundle::read_json;
use org_backup::error::BackupError;
use org_backup::model::{IssueRecord, LabelRecord, OrganizationManifest, RepositorySnapshot};
use org_backup::publish::PublishScope;
use org_backup::stage::{RunResult, Stage};
use std::fs;
use tempfile::TempDir;

fn bug() -> LabelRecord {
    LabelRecord::new("bug", "d73a4a")
}

#[test]
fn test_failing_label_fetch_is_isolated() {
    let dir = TempDir::new().unwrap();
    let provider = FakeProvider::new("acme")
        .with_repository("r1")
        .with_repository("r2")
        .with_labels("r1", vec![bug()])
        .failing("r2", Op::FetchLabels);
    let vcs = FakeVcs::default();

    let result = OrganizationBackupOrchestrator::new(dir.path(), &provider, &vcs, &ZipArchiver)
        .run("acme", &[], &BackupOptions::default())
        .unwrap();

    assert_eq!(result.manifest.repositories, vec!["r1", "r2"]);

    let labels: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("acme/r1/labels.json")).unwrap())
            .unwrap();
    assert_eq!(labels, serde_json::json!([{"name": "bug", "color": "d73a4a"}]));
    assert!(!dir.path().join("acme/r2/labels.json").exists());

    // The other stages of r2 still ran.
    assert!(dir.path().join("acme/r2/issues.json").is_file());
    assert!(dir.path().join("acme/r2/repository.json").is_file());

    assert!(result.repo("r1").unwrap().status.is_success());
    assert_eq!(result.repo("r2").unwrap().status.failed_stages(), &[Stage::Labels]);
    assert_eq!(result.summary.partial, 1);

    let manifest: OrganizationManifest =
        read_json(&dir.path().join("acme/organization.json")).unwrap();
    assert_eq!(manifest, result.manifest);
    assert_eq!(manifest.website.as_deref(), Some("https://acme.example.com"));
}

#[test]
fn test_issues_in_every_state_are_saved() {
    let dir = TempDir::new().unwrap();
    let provider = FakeProvider::new("acme").with_repository("r1").with_issues(
        "r1",
        vec![open_issue(1, "Crash on start"), closed_issue(2, "Typo in README")],
    );
    let vcs = FakeVcs::default();

    OrganizationBackupOrchestrator::new(dir.path(), &provider, &vcs, &ZipArchiver)
        .run("acme", &[], &BackupOptions::default())
        .unwrap();

    let issues: Vec<IssueRecord> = read_json(&dir.path().join("acme/r1/issues.json")).unwrap();
    assert_eq!(issues.len(), 2);
    for issue in &issues {
        assert_eq!(issue.closed_at.is_none(), issue.is_open(), "issue #{}", issue.number);
    }
    assert_eq!(issues[0].title, "Crash on start");

    let raw = fs::read_to_string(dir.path().join("acme/r1/issues.json")).unwrap();
    assert!(raw.contains("\"user\": \"octocat\""));
    assert!(raw.contains("\"state\": \"closed\""));
}

#[test]
fn test_metadata_written_with_historical_keys() {
    let dir = TempDir::new().unwrap();
    let provider = FakeProvider::new("acme").with_repository("r1");
    let vcs = FakeVcs::default();

    OrganizationBackupOrchestrator::new(dir.path(), &provider, &vcs, &ZipArchiver)
        .run("acme", &[], &BackupOptions::default())
        .unwrap();

    let path = dir.path().join("acme/r1/repository.json");
    let snapshot: RepositorySnapshot = read_json(&path).unwrap();
    assert_eq!(snapshot.homepage.as_deref(), Some("https://r1.example.com"));
    assert!(fs::read_to_string(path).unwrap().contains("\"website\""));
}

#[test]
fn test_skipped_stages_write_nothing() {
    let dir = TempDir::new().unwrap();
    let provider = FakeProvider::new("acme")
        .with_repository("r1")
        .failing("r1", Op::FetchLabels)
        .failing("r1", Op::FetchIssues);
    let vcs = FakeVcs::default();
    let options = BackupOptions {
        include_labels: false,
        include_issues: false,
        ..BackupOptions::default()
    };

    let result = OrganizationBackupOrchestrator::new(dir.path(), &provider, &vcs, &ZipArchiver)
        .run("acme", &[], &options)
        .unwrap();

    assert!(result.repo("r1").unwrap().status.is_success());
    assert!(!dir.path().join("acme/r1/labels.json").exists());
    assert!(!dir.path().join("acme/r1/issues.json").exists());
    assert!(dir.path().join("acme/r1/repository.json").is_file());
}

#[test]
fn test_selection_limits_repositories() {
    let dir = TempDir::new().unwrap();
    let provider = FakeProvider::new("acme")
        .with_repository("r1")
        .with_repository("r2")
        .with_repository("r3");
    let vcs = FakeVcs::default();

    let selection = vec!["r3".to_string(), "r1".to_string(), "gone".to_string()];
    let result = OrganizationBackupOrchestrator::new(dir.path(), &provider, &vcs, &ZipArchiver)
        .run("acme", &selection, &BackupOptions::default())
        .unwrap();

    // Provider order, not selection order.
    assert_eq!(result.manifest.repositories, vec!["r1", "r3"]);
    assert!(!dir.path().join("acme/r2").exists());
}

#[test]
fn test_unknown_organization_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let provider = FakeProvider::missing("acme");
    let vcs = FakeVcs::default();

    let err = OrganizationBackupOrchestrator::new(dir.path(), &provider, &vcs, &ZipArchiver)
        .run("acme", &[], &BackupOptions::default())
        .unwrap_err();

    assert!(matches!(err, BackupError::OrganizationNotFound { .. }));
    assert!(!dir.path().join("acme").exists());
}

#[test]
fn test_enumeration_failure_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let provider = FakeProvider::new("acme")
        .with_repository("r1")
        .failing("acme", Op::ListRepositories);
    let vcs = FakeVcs::default();

    let err = OrganizationBackupOrchestrator::new(dir.path(), &provider, &vcs, &ZipArchiver)
        .run("acme", &[], &BackupOptions::default())
        .unwrap_err();

    assert!(matches!(err, BackupError::EnumerationFailed { .. }));
    assert!(!dir.path().join("acme").exists());
}

#[test]
fn test_empty_organization_still_writes_manifest() {
    let dir = TempDir::new().unwrap();
    let provider = FakeProvider::new("acme");
    let vcs = FakeVcs::default();

    let result = OrganizationBackupOrchestrator::new(dir.path(), &provider, &vcs, &ZipArchiver)
        .run("acme", &[], &BackupOptions::default())
        .unwrap();

    assert!(result.manifest.repositories.is_empty());
    assert!(dir.path().join("acme/organization.json").is_file());
}

#[test]
fn test_uncreatable_folder_is_fatal_and_left_out_of_manifest() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("acme")).unwrap();
    // A file where the repository folder should go.
    fs::write(dir.path().join("acme/r1"), "not a directory").unwrap();

    let provider = FakeProvider::new("acme")
        .with_repository("r1")
        .with_repository("r2");
    let vcs = FakeVcs::default();

    let result = OrganizationBackupOrchestrator::new(dir.path(), &provider, &vcs, &ZipArchiver)
        .run("acme", &[], &BackupOptions::default())
        .unwrap();

    assert!(matches!(result.repo("r1").unwrap().status, RunResult::Fatal(_)));
    assert_eq!(result.manifest.repositories, vec!["r2"]);
    assert_eq!(result.summary.failed, 1);
}

#[test]
fn test_history_clone_and_snapshot() {
    let dir = TempDir::new().unwrap();
    let provider = FakeProvider::new("acme").with_repository("r1");
    let vcs = FakeVcs::default();
    let options = BackupOptions {
        clone_history: true,
        ..BackupOptions::default()
    };

    let result = OrganizationBackupOrchestrator::new(dir.path(), &provider, &vcs, &ZipArchiver)
        .run("acme", &[], &options)
        .unwrap();
    assert!(result.repo("r1").unwrap().status.is_success());

    let repo_dir = dir.path().join("acme/r1");
    let clone = fs::read_dir(&repo_dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| p.is_dir())
        .unwrap();
    let folder = clone.file_name().unwrap().to_str().unwrap().to_string();

    assert!(folder.starts_with("r1_"));
    assert_eq!(folder.len(), "r1_2024-03-02_14-05-09".len());
    assert!(clone.join("README.md").is_file());
    assert!(repo_dir.join(format!("{}.zip", folder)).is_file());
}

#[test]
fn test_failed_clone_removes_partial_folder() {
    let dir = TempDir::new().unwrap();
    let provider = FakeProvider::new("acme").with_repository("r1");
    let vcs = FakeVcs::default().failing_clone("https://github.com/acme/r1.git");
    let options = BackupOptions {
        clone_history: true,
        ..BackupOptions::default()
    };

    let result = OrganizationBackupOrchestrator::new(dir.path(), &provider, &vcs, &ZipArchiver)
        .run("acme", &[], &options)
        .unwrap();

    assert_eq!(result.repo("r1").unwrap().status.failed_stages(), &[Stage::History]);
    assert_eq!(result.manifest.repositories, vec!["r1"]);

    let leftovers: Vec<_> = fs::read_dir(dir.path().join("acme/r1"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("r1_"))
        .collect();
    assert!(leftovers.is_empty(), "left behind: {:?}", leftovers);
}

#[test]
fn test_publish_uploads_and_removes_dated_artifacts() {
    let dir = TempDir::new().unwrap();
    let org_dir = dir.path().join("acme");
    fs::create_dir_all(&org_dir).unwrap();
    // Left over from an earlier run whose upload failed.
    let stale = org_dir.join("r1_2020-01-01.zip");
    fs::write(&stale, b"PK\x05\x06").unwrap();

    let provider = FakeProvider::new("acme").with_repository("r1");
    let vcs = FakeVcs::default();
    let publisher = RecordingPublisher::default();
    let options = BackupOptions {
        publish: true,
        ..BackupOptions::default()
    };

    let result = OrganizationBackupOrchestrator::new(dir.path(), &provider, &vcs, &ZipArchiver)
        .with_publisher(&publisher)
        .run("acme", &[], &options)
        .unwrap();

    assert!(result.repo("r1").unwrap().status.is_success());

    let latest = dated_artifact_path(&org_dir.join("r1"));
    let latest_name = latest.file_name().unwrap().to_str().unwrap();
    assert_eq!(
        publisher.uploads(),
        vec![
            "acme/r1_2020-01-01.zip".to_string(),
            format!("acme/{}", latest_name)
        ]
    );
    assert!(!latest.exists());
    assert!(!stale.exists());
    assert!(org_dir.join("r1/repository.json").is_file());
}

#[test]
fn test_publish_latest_only_leaves_stale_artifacts() {
    let dir = TempDir::new().unwrap();
    let org_dir = dir.path().join("acme");
    fs::create_dir_all(&org_dir).unwrap();
    let stale = org_dir.join("r1_2020-01-01.zip");
    fs::write(&stale, b"PK\x05\x06").unwrap();

    let provider = FakeProvider::new("acme").with_repository("r1");
    let vcs = FakeVcs::default();
    let publisher = RecordingPublisher::default();
    let options = BackupOptions {
        publish: true,
        publish_scope: PublishScope::LatestOnly,
        ..BackupOptions::default()
    };

    OrganizationBackupOrchestrator::new(dir.path(), &provider, &vcs, &ZipArchiver)
        .with_publisher(&publisher)
        .run("acme", &[], &options)
        .unwrap();

    assert_eq!(publisher.uploads().len(), 1);
    assert!(stale.exists());
}

#[test]
fn test_rejected_upload_keeps_artifact() {
    let dir = TempDir::new().unwrap();
    let provider = FakeProvider::new("acme").with_repository("r1");
    let vcs = FakeVcs::default();

    let latest = dated_artifact_path(&dir.path().join("acme/r1"));
    let blob = format!("acme/{}", latest.file_name().unwrap().to_str().unwrap());
    let publisher = RecordingPublisher::default().rejecting(&blob);
    let options = BackupOptions {
        publish: true,
        ..BackupOptions::default()
    };

    let result = OrganizationBackupOrchestrator::new(dir.path(), &provider, &vcs, &ZipArchiver)
        .with_publisher(&publisher)
        .run("acme", &[], &options)
        .unwrap();

    assert_eq!(result.repo("r1").unwrap().status.failed_stages(), &[Stage::Publish]);
    assert!(latest.is_file());
    assert_eq!(result.manifest.repositories, vec!["r1"]);
}

#[test]
fn test_publish_without_publisher_fails_only_that_stage() {
    let dir = TempDir::new().unwrap();
    let provider = FakeProvider::new("acme").with_repository("r1");
    let vcs = FakeVcs::default();
    let options = BackupOptions {
        publish: true,
        ..BackupOptions::default()
    };

    let result = OrganizationBackupOrchestrator::new(dir.path(), &provider, &vcs, &ZipArchiver)
        .run("acme", &[], &options)
        .unwrap();

    assert_eq!(result.repo("r1").unwrap().status.failed_stages(), &[Stage::Publish]);
    assert!(dated_artifact_path(&dir.path().join("acme/r1")).is_file());
}
