//! Error types for quill modules using thiserror.

use thiserror::Error;

use crate::pipeline::{PipelineState, Stage};

/// Errors from reading staged changes or writing commits.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Not a git repository: {0}")]
    NoRepository(#[source] git2::Error),

    #[error("No staged changes found. Stage files with `git add` first.")]
    NoStagedChanges,

    #[error("Failed to read staged diff: {0}")]
    Io(#[source] git2::Error),

    #[error("Cannot work with a bare repository")]
    BareRepository,

    #[error("Failed to create commit: {0}")]
    CommitFailed(#[source] git2::Error),

    #[error("Git config error (missing user.name or user.email): {0}")]
    ConfigError(#[source] git2::Error),

    #[error("Failed to read diff from {path}: {source}")]
    DiffFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from parsing unified diff text into change records.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DiffParseError {
    #[error("Unparseable diff at line {line}: {reason}")]
    Unparseable { line: usize, reason: String },

    #[error("Diff contains no file changes")]
    Empty,
}

/// Errors from the text-generation service.
///
/// Every variant is terminal for the step that issued the request. Nothing
/// in quill retries a failed request.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Generation service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Generation service timed out after {0} seconds")]
    Timeout(u64),

    #[error("Generation service returned a malformed response: {0}")]
    MalformedResponse(String),
}

/// Errors from Claude CLI operations.
#[derive(Error, Debug)]
pub enum ClaudeError {
    #[error("Claude Code CLI not found. Install with: npm install -g @anthropic-ai/claude-code")]
    NotInstalled,

    #[error("Claude Code CLI failed to execute: {0}")]
    ExecutionFailed(String),

    #[error("Failed to spawn Claude process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Claude process timed out after {0} seconds")]
    Timeout(u64),

    #[error("Claude CLI exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },
}

impl From<ClaudeError> for GenerationError {
    fn from(err: ClaudeError) -> Self {
        match err {
            ClaudeError::Timeout(secs) => GenerationError::Timeout(secs),
            other => GenerationError::ServiceUnavailable(other.to_string()),
        }
    }
}

/// Errors from changelog persistence.
#[derive(Error, Debug)]
pub enum ChangelogError {
    #[error("Failed to write changelog: {0}")]
    WriteFailed(#[source] std::io::Error),

    #[error("Changelog store lock was poisoned")]
    LockPoisoned,
}

/// Why a single pipeline step failed.
#[derive(Error, Debug)]
pub enum PipelineErrorKind {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Parse(#[from] DiffParseError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Run was cancelled")]
    Cancelled,

    #[error("Missing {0} from an earlier step")]
    MissingInput(&'static str),
}

/// A failed pipeline run.
///
/// Carries the stage that failed and the state as it was at that moment,
/// including the error entry appended to the transcript.
#[derive(Error, Debug)]
#[error("{stage} failed: {kind}")]
pub struct PipelineError {
    pub stage: Stage,
    pub kind: PipelineErrorKind,
    pub state: Box<PipelineState>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claude_timeout_maps_to_generation_timeout() {
        let err: GenerationError = ClaudeError::Timeout(30).into();
        assert!(matches!(err, GenerationError::Timeout(30)));
    }

    #[test]
    fn test_claude_exit_maps_to_service_unavailable() {
        let err: GenerationError = ClaudeError::NonZeroExit {
            code: 2,
            stderr: "rate limited".to_string(),
        }
        .into();
        match err {
            GenerationError::ServiceUnavailable(msg) => assert!(msg.contains("rate limited")),
            other => panic!("Expected ServiceUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_pipeline_error_names_the_stage() {
        let err = PipelineError {
            stage: Stage::Analyze,
            kind: GenerationError::Timeout(120).into(),
            state: Box::default(),
        };
        assert_eq!(
            err.to_string(),
            "Analyze failed: Generation service timed out after 120 seconds"
        );
        // The kind is already part of the message, so it is not repeated as a source.
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_no_staged_changes_message_mentions_git_add() {
        assert!(GitError::NoStagedChanges.to_string().contains("git add"));
    }
}
