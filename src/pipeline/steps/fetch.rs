use tracing::debug;

use crate::error::{GitError, PipelineErrorKind};
use crate::git::DiffSource;
use crate::pipeline::state::{EntryKind, PipelineState, Role};

/// Read the staged diff and record it in the transcript.
///
/// Whitespace-only output counts as no staged changes.
pub fn fetch_diff<S: DiffSource + ?Sized>(
    state: &mut PipelineState,
    source: &S,
) -> Result<(), PipelineErrorKind> {
    let text = source.staged_diff()?;
    if text.trim().is_empty() {
        return Err(GitError::NoStagedChanges.into());
    }

    debug!(bytes = text.len(), "Fetched staged diff");
    state.record(Role::Human, EntryKind::StagedDiff, text);
    Ok(())
}
