//! Where rendered changelog sections end up.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::changelog::format::CHANGELOG_HEADER;
use crate::error::ChangelogError;

/// Destination for rendered changelog sections.
pub trait ChangelogStore: Send + Sync {
    fn append(&self, section: &str) -> Result<(), ChangelogError>;
}

/// Appends sections to a Markdown file, creating it with a header first.
///
/// Appends from one process are serialized; the file is opened in append
/// mode so existing content is never rewritten.
#[derive(Debug)]
pub struct FileChangelogStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileChangelogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChangelogStore for FileChangelogStore {
    fn append(&self, section: &str) -> Result<(), ChangelogError> {
        let _guard = self.lock.lock().map_err(|_| ChangelogError::LockPoisoned)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(ChangelogError::WriteFailed)?;
        let is_new = file.metadata().map_err(ChangelogError::WriteFailed)?.len() == 0;

        let mut text = String::new();
        if is_new {
            text.push_str(CHANGELOG_HEADER);
        }
        text.push('\n');
        text.push_str(section.trim_end());
        text.push('\n');

        file.write_all(text.as_bytes())
            .map_err(ChangelogError::WriteFailed)?;
        debug!(path = %self.path.display(), new_file = is_new, "Appended changelog section");
        Ok(())
    }
}
