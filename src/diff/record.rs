//! Per-file change records produced by the diff parser.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a file was changed in the staged diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    New,
    Deleted,
    Renamed,
    ModeChanged,
    Modified,
    Binary,
    Submodule,
    Conflict,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 8] = [
        ChangeKind::New,
        ChangeKind::Deleted,
        ChangeKind::Renamed,
        ChangeKind::ModeChanged,
        ChangeKind::Modified,
        ChangeKind::Binary,
        ChangeKind::Submodule,
        ChangeKind::Conflict,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::New => "NEW",
            ChangeKind::Deleted => "DELETED",
            ChangeKind::Renamed => "RENAMED",
            ChangeKind::ModeChanged => "MODE_CHANGED",
            ChangeKind::Modified => "MODIFIED",
            ChangeKind::Binary => "BINARY",
            ChangeKind::Submodule => "SUBMODULE",
            ChangeKind::Conflict => "CONFLICT",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contiguous block of changed lines with its surrounding context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    pub old_start: u32,
    pub old_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
    /// Text after the closing `@@`, usually the enclosing function or section.
    pub section: String,
    /// Body lines including their `+`, `-` or ` ` origin marker.
    pub lines: Vec<String>,
}

impl Hunk {
    pub fn added(&self) -> usize {
        self.lines.iter().filter(|l| l.starts_with('+')).count()
    }

    pub fn removed(&self) -> usize {
        self.lines.iter().filter(|l| l.starts_with('-')).count()
    }

    /// Render the hunk back into unified diff form.
    pub fn render(&self) -> String {
        let mut out = format!(
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_lines, self.new_start, self.new_lines
        );
        if !self.section.is_empty() {
            out.push(' ');
            out.push_str(&self.section);
        }
        for line in &self.lines {
            out.push('\n');
            out.push_str(line);
        }
        out
    }
}

/// One file's change description.
///
/// Fields are private so that `old_path` can only be present on renames and
/// the line counts always match the hunks they were derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    path: String,
    change_kind: ChangeKind,
    old_path: Option<String>,
    added_lines: usize,
    removed_lines: usize,
    hunks: Vec<Hunk>,
    purpose: String,
}

impl ChangeRecord {
    /// Build a record. `old_path` is kept only for [`ChangeKind::Renamed`].
    pub fn new(
        path: impl Into<String>,
        change_kind: ChangeKind,
        old_path: Option<String>,
        hunks: Vec<Hunk>,
    ) -> Self {
        let old_path = match change_kind {
            ChangeKind::Renamed => old_path,
            _ => None,
        };
        let added_lines = hunks.iter().map(Hunk::added).sum();
        let removed_lines = hunks.iter().map(Hunk::removed).sum();

        Self {
            path: path.into(),
            change_kind,
            old_path,
            added_lines,
            removed_lines,
            hunks,
            purpose: String::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn change_kind(&self) -> ChangeKind {
        self.change_kind
    }

    pub fn old_path(&self) -> Option<&str> {
        self.old_path.as_deref()
    }

    pub fn added_lines(&self) -> usize {
        self.added_lines
    }

    pub fn removed_lines(&self) -> usize {
        self.removed_lines
    }

    pub fn hunks(&self) -> &[Hunk] {
        &self.hunks
    }

    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    pub fn set_purpose(&mut self, purpose: impl Into<String>) {
        self.purpose = purpose.into();
    }

    /// All hunks rendered as one unified diff fragment.
    pub fn hunk_text(&self) -> String {
        self.hunks
            .iter()
            .map(Hunk::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
