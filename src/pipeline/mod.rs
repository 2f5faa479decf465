//! The commit-message pipeline.
//!
//! A [`Coordinator`] runs FetchDiff, Analyze, Draft, Validate, Repair and
//! Changelog over a single [`PipelineState`]. Validate is the only stage with
//! two successors; it returns a [`Transition`] and Repair loops back to it
//! until the message passes or the repair budget is spent.

pub mod analysis;
pub mod coordinator;
pub mod prompt;
pub mod stage;
pub mod state;
pub mod steps;
pub mod verdict;

pub use analysis::{DiffAnalysis, FileAssessment, is_public_interface};
pub use coordinator::{Coordinator, PipelineOutcome};
pub use stage::{Stage, Transition};
pub use state::{EntryKind, PipelineState, Role, TranscriptEntry};
pub use verdict::{CommitDraft, QualityVerdict};
