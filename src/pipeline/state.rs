//! The mutable context threaded through one pipeline run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pipeline::analysis::DiffAnalysis;
use crate::pipeline::stage::Stage;
use crate::pipeline::verdict::QualityVerdict;

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Input taken from the user's repository.
    Human,
    /// Produced by quill itself.
    System,
    /// Produced by the generation service.
    Assistant,
}

/// What a transcript entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    StagedDiff,
    Analysis,
    Draft,
    Verdict,
    Repair,
    Changelog,
    Error,
}

/// One audit record. Entries are never edited after being appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub kind: EntryKind,
    pub content: String,
    /// Value of the repair counter when the entry was recorded.
    pub attempt: u32,
    pub is_error: bool,
    pub at: DateTime<Utc>,
}

/// State owned by a single run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineState {
    transcript: Vec<TranscriptEntry>,
    /// Repairs performed since the last draft.
    pub attempts: u32,
    pub analysis: Option<DiffAnalysis>,
    /// Current candidate commit message.
    pub final_message: Option<String>,
    pub last_verdict: Option<QualityVerdict>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// Append a successful entry.
    pub fn record(&mut self, role: Role, kind: EntryKind, content: impl Into<String>) {
        self.push(role, kind, content.into(), false);
    }

    /// Append an error entry for a failed stage.
    pub fn record_error(&mut self, stage: Stage, message: impl Into<String>) {
        let content = format!("{stage}: {}", message.into());
        self.push(Role::System, EntryKind::Error, content, true);
    }

    /// Most recent non-error entry of `kind`.
    pub fn latest(&self, kind: EntryKind) -> Option<&TranscriptEntry> {
        self.transcript
            .iter()
            .rev()
            .find(|e| e.kind == kind && !e.is_error)
    }

    pub fn count(&self, kind: EntryKind) -> usize {
        self.transcript.iter().filter(|e| e.kind == kind).count()
    }

    fn push(&mut self, role: Role, kind: EntryKind, content: String, is_error: bool) {
        self.transcript.push(TranscriptEntry {
            role,
            kind,
            content,
            attempt: self.attempts,
            is_error,
            at: Utc::now(),
        });
    }
}
