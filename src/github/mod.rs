//! GitHub API integration.
//!
//! This module provides the production [`ResourceClient`]: a blocking client
//! for the GitHub REST API that can:
//! - Resolve organizations and list their repositories
//! - Read labels, issues, and repository attributes
//! - Create labels, issues, and repositories, and edit repository attributes
//!
//! # Example
//!
//! ```rust,no_run
//! use org_backup::github::{GitHubClient, ResourceClient};
//!
//! let client = GitHubClient::new("ghp_your_token_here");
//!
//! for repo in client.list_repositories("my-org")? {
//!     let labels = client.fetch_labels("my-org", &repo.name)?;
//!     println!("{}: {} labels", repo.name, labels.len());
//! }
//! # Ok::<(), org_backup::error::BackupError>(())
//! ```

mod client;
mod resources;
mod types;

pub use client::GitHubClient;
pub use resources::ResourceClient;
pub use types::{Organization, RemoteRepository};
