//! Git commit operations.

use crate::error::Result;
use crate::git::GitOps;
use git2::{Commit, ErrorCode, IndexAddOption, Signature};

/// Commit operations for GitOps.
pub trait CommitOps {
    /// Stage all files, including ones matched by ignore rules.
    fn stage_all(&self) -> Result<()>;

    /// Create a commit with the staged changes.
    ///
    /// On an unborn branch this creates the root commit.
    fn commit(&self, message: &str) -> Result<git2::Oid>;
}

impl CommitOps for GitOps {
    fn stage_all(&self) -> Result<()> {
        let mut index = self.repo.index()?;

        // Restored files were tracked at backup time, so ignore rules must not drop them
        index.add_all(["*"].iter(), IndexAddOption::FORCE, None)?;
        index.update_all(["*"].iter(), None)?;

        index.write()?;
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<git2::Oid> {
        let signature = self.get_signature()?;

        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;

        let parents = self.head_commit()?;
        let parent_refs: Vec<&Commit<'_>> = parents.iter().collect();

        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parent_refs,
        )?;

        Ok(oid)
    }
}

impl GitOps {
    fn get_signature(&self) -> Result<Signature<'_>> {
        self.repo.signature().or_else(|_| {
            // Fallback signature for automation
            Signature::now("org-backup", "org-backup@automated.local").map_err(|e| e.into())
        })
    }

    fn head_commit(&self) -> Result<Option<Commit<'_>>> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
