//! Git branch queries.

use crate::error::{BackupError, Result};
use crate::git::GitOps;

/// Branch queries for GitOps.
pub trait BranchOps {
    /// Get the current branch name.
    fn current_branch(&self) -> Result<String>;

    /// List remote-tracking branches, e.g. `origin/main`.
    fn remote_branches(&self) -> Result<Vec<String>>;
}

impl BranchOps for GitOps {
    fn current_branch(&self) -> Result<String> {
        let head = self.repo.head()?;

        if head.is_branch() {
            head.shorthand()
                .map(String::from)
                .ok_or_else(|| BackupError::Git(git2::Error::from_str("HEAD has no shorthand name")))
        } else {
            Err(BackupError::Git(git2::Error::from_str(
                "HEAD is not pointing to a branch (detached HEAD state)",
            )))
        }
    }

    fn remote_branches(&self) -> Result<Vec<String>> {
        let branches = self.repo.branches(Some(git2::BranchType::Remote))?;
        let mut names = Vec::new();

        for branch_result in branches {
            let (branch, _) = branch_result?;
            if let Some(name) = branch.name()? {
                // Skip the symbolic origin/HEAD
                if !name.ends_with("/HEAD") {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }
}
