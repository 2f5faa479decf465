//! quill - A CLI tool that drafts conventional commit messages and changelog
//! entries from staged changes.
//!
//! # Overview
//!
//! quill reads the staged diff, asks a text-generation service what each file
//! change does, drafts a conventional commit message, checks it and repairs it
//! a bounded number of times, then renders a Markdown changelog section.
//! The [`pipeline::Coordinator`] drives those steps; everything it talks to
//! sits behind a trait so runs can be tested without git or a model.

pub mod changelog;
pub mod commit;
pub mod config;
pub mod diff;
pub mod error;
pub mod git;
pub mod llm;
pub mod pipeline;

// Re-export commonly used types
pub use changelog::{ChangelogStore, FileChangelogStore};
pub use commit::{CommitType, check_structure};
pub use config::{GenerationConfig, PipelineConfig, Provider};
pub use diff::{ChangeKind, ChangeRecord, parse_diff};
pub use error::{
    ChangelogError, ClaudeError, DiffParseError, GenerationError, GitError, PipelineError,
    PipelineErrorKind,
};
pub use git::{DiffSource, GitRepository};
pub use llm::{GenerationRequest, Generator, PromptKind};
pub use pipeline::{Coordinator, DiffAnalysis, PipelineOutcome, PipelineState, QualityVerdict, Stage};
