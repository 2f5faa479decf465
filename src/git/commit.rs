//! Commit creation from the current index.

use std::path::Path;

use git2::{Oid, Repository};
use tracing::info;

use crate::error::GitError;

/// Create a commit on HEAD from whatever is staged, with `message`.
///
/// Only the index is committed; unstaged edits stay in the working tree.
/// Works on an unborn branch by creating a root commit.
pub fn create_commit(repo_path: &Path, message: &str) -> Result<Oid, GitError> {
    let repo = Repository::discover(repo_path).map_err(GitError::NoRepository)?;
    if repo.is_bare() {
        return Err(GitError::BareRepository);
    }

    let mut index = repo.index().map_err(GitError::Io)?;
    let tree_id = index.write_tree().map_err(GitError::CommitFailed)?;
    let tree = repo.find_tree(tree_id).map_err(GitError::CommitFailed)?;

    let sig = repo.signature().map_err(GitError::ConfigError)?;

    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit().map_err(GitError::CommitFailed)?),
        Err(e)
            if e.code() == git2::ErrorCode::UnbornBranch
                || e.code() == git2::ErrorCode::NotFound =>
        {
            None
        }
        Err(e) => return Err(GitError::CommitFailed(e)),
    };
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

    let oid = repo
        .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .map_err(GitError::CommitFailed)?;

    info!(%oid, "Created commit");
    Ok(oid)
}
