//! Staged diff collection from the index using git2.

use std::path::{Path, PathBuf};

use git2::{Diff, DiffFindOptions, DiffFormat, ErrorCode, Repository, Tree};
use tracing::debug;

use crate::error::GitError;

/// Source of the staged changes for one repository.
#[cfg_attr(test, mockall::automock)]
pub trait DiffSource: Send + Sync {
    /// Unified diff text of everything staged against HEAD.
    fn staged_diff(&self) -> Result<String, GitError>;
}

impl<S: DiffSource + ?Sized> DiffSource for Box<S> {
    fn staged_diff(&self) -> Result<String, GitError> {
        (**self).staged_diff()
    }
}

/// A repository on disk, discovered from `path` or any of its parents.
#[derive(Debug, Clone)]
pub struct GitRepository {
    path: PathBuf,
}

impl GitRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<Repository, GitError> {
        let repo = Repository::discover(&self.path).map_err(GitError::NoRepository)?;
        if repo.is_bare() {
            return Err(GitError::BareRepository);
        }
        Ok(repo)
    }
}

impl DiffSource for GitRepository {
    fn staged_diff(&self) -> Result<String, GitError> {
        let repo = self.open()?;
        let head_tree = resolve_head_tree(&repo)?;

        let mut diff = repo
            .diff_tree_to_index(head_tree.as_ref(), None, None)
            .map_err(GitError::Io)?;

        let mut find = DiffFindOptions::new();
        find.renames(true);
        diff.find_similar(Some(&mut find)).map_err(GitError::Io)?;

        let text = render_patch(&diff)?;
        if text.trim().is_empty() {
            return Err(GitError::NoStagedChanges);
        }

        debug!(
            files = diff.deltas().len(),
            bytes = text.len(),
            "Collected staged diff"
        );
        Ok(text)
    }
}

/// Resolve the HEAD tree, treating an unborn branch as "no tree".
///
/// Returns `Ok(None)` for repos with no commits, `Ok(Some(tree))` for repos
/// with a valid HEAD, and `Err(GitError::Io)` for real failures such as a
/// corrupt HEAD.
pub(crate) fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, GitError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(GitError::Io(e)),
    };

    let tree = head_ref.peel_to_tree().map_err(GitError::Io)?;
    Ok(Some(tree))
}

/// Print a diff in patch form, the same text `git diff --cached` produces.
fn render_patch(diff: &Diff<'_>) -> Result<String, GitError> {
    let mut text = String::new();

    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        let origin = line.origin();
        // "\ No newline at end of file" markers carry no content.
        if matches!(origin, '=' | '>' | '<') {
            return true;
        }

        if matches!(origin, '+' | '-' | ' ') {
            text.push(origin);
        }
        text.push_str(&String::from_utf8_lossy(line.content()));
        if !text.ends_with('\n') {
            text.push('\n');
        }

        true
    })
    .map_err(GitError::Io)?;

    Ok(text)
}
