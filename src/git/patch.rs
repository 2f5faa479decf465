//! Diff text supplied from a file or stdin instead of the index.

use std::io::Read;
use std::path::PathBuf;

use tracing::debug;

use crate::error::GitError;
use crate::git::DiffSource;

/// A unified diff read from `path`, or from stdin when the path is `-`.
#[derive(Debug, Clone)]
pub struct PatchFile {
    path: PathBuf,
}

impl PatchFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn is_stdin(&self) -> bool {
        self.path.as_os_str() == "-"
    }

    fn read(&self) -> std::io::Result<String> {
        if self.is_stdin() {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        } else {
            std::fs::read_to_string(&self.path)
        }
    }
}

impl DiffSource for PatchFile {
    fn staged_diff(&self) -> Result<String, GitError> {
        let text = self.read().map_err(|source| GitError::DiffFile {
            path: self.path.display().to_string(),
            source,
        })?;
        if text.trim().is_empty() {
            return Err(GitError::NoStagedChanges);
        }

        debug!(path = %self.path.display(), bytes = text.len(), "Read diff file");
        Ok(text)
    }
}
