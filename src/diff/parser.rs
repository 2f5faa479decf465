//! Unified diff parsing into [`ChangeRecord`]s.
//!
//! Accepts the output of `git diff --cached` (and the equivalent text that
//! git2 prints in patch format), including combined diffs for unmerged paths.

use std::sync::LazyLock;

use regex_lite::Regex;
use tracing::debug;

use crate::diff::record::{ChangeKind, ChangeRecord, Hunk};
use crate::error::DiffParseError;

static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@ ?(.*)$").expect("Invalid regex")
});

static COMBINED_HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@@ -(\d+)(?:,(\d+))? -\d+(?:,\d+)? \+(\d+)(?:,(\d+))? @@@ ?(.*)$")
        .expect("Invalid regex")
});

const DEV_NULL: &str = "/dev/null";
const SUBMODULE_MODE: &str = "160000";

const MARKER_OURS: u8 = 0b001;
const MARKER_SPLIT: u8 = 0b010;
const MARKER_THEIRS: u8 = 0b100;
const ALL_MARKERS: u8 = MARKER_OURS | MARKER_SPLIT | MARKER_THEIRS;

/// Parse unified diff text into one record per file, in diff order.
///
/// Returns [`DiffParseError::Empty`] when the text holds no file sections and
/// [`DiffParseError::Unparseable`] for malformed hunk headers or stray
/// content lines outside any hunk.
pub fn parse_diff(text: &str) -> Result<Vec<ChangeRecord>, DiffParseError> {
    let mut records = Vec::new();
    let mut current: Option<FileSection> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;

        if let Some(rest) = line.strip_prefix("diff --git ") {
            if let Some(section) = current.take() {
                records.push(section.finish());
            }
            current = Some(FileSection::from_git_header(rest));
            continue;
        }

        if let Some(rest) = line
            .strip_prefix("diff --cc ")
            .or_else(|| line.strip_prefix("diff --combined "))
        {
            if let Some(section) = current.take() {
                records.push(section.finish());
            }
            current = Some(FileSection::combined(rest));
            continue;
        }

        let Some(section) = current.as_mut() else {
            if line.trim().is_empty() {
                continue;
            }
            return Err(DiffParseError::Unparseable {
                line: line_no,
                reason: format!("expected a file header, found '{}'", truncate(line)),
            });
        };

        section.feed(line, line_no)?;
    }

    if let Some(section) = current.take() {
        records.push(section.finish());
    }

    if records.is_empty() {
        return Err(DiffParseError::Empty);
    }

    debug!("Parsed {} file(s) from diff", records.len());
    Ok(records)
}

/// Accumulates the header and hunks of one file while parsing.
#[derive(Default)]
struct FileSection {
    header_old: Option<String>,
    header_new: Option<String>,
    minus_path: Option<String>,
    plus_path: Option<String>,
    rename_from: Option<String>,
    rename_to: Option<String>,
    new_file: bool,
    deleted_file: bool,
    old_mode: Option<String>,
    new_mode: Option<String>,
    binary: bool,
    submodule: bool,
    combined: bool,
    /// Which of the three merge-conflict markers appear on added lines.
    conflict_markers: u8,
    /// Set after `GIT binary patch`; the rest of the section is payload.
    in_binary_payload: bool,
    hunks: Vec<Hunk>,
    open: Option<OpenHunk>,
}

struct OpenHunk {
    hunk: Hunk,
    old_remaining: u32,
    new_remaining: u32,
}

impl FileSection {
    fn from_git_header(rest: &str) -> Self {
        let (old, new) = split_header_paths(rest);
        Self {
            header_old: old,
            header_new: new,
            ..Self::default()
        }
    }

    fn combined(path: &str) -> Self {
        let path = unquote(path.trim()).to_string();
        Self {
            header_old: Some(path.clone()),
            header_new: Some(path),
            combined: true,
            ..Self::default()
        }
    }

    fn feed(&mut self, line: &str, line_no: usize) -> Result<(), DiffParseError> {
        if self.in_binary_payload {
            return Ok(());
        }

        if self.combined {
            return self.feed_combined(line, line_no);
        }

        if let Some(open) = self.open.as_mut()
            && (open.old_remaining > 0 || open.new_remaining > 0)
        {
            if line.starts_with('\\') {
                return Ok(());
            }
            let line = if line.is_empty() { " " } else { line };
            match line.as_bytes()[0] {
                b' ' => {
                    open.old_remaining = open.old_remaining.saturating_sub(1);
                    open.new_remaining = open.new_remaining.saturating_sub(1);
                }
                b'-' => open.old_remaining = open.old_remaining.saturating_sub(1),
                b'+' => open.new_remaining = open.new_remaining.saturating_sub(1),
                _ => {
                    return Err(DiffParseError::Unparseable {
                        line: line_no,
                        reason: format!("hunk ended early at '{}'", truncate(line)),
                    });
                }
            }
            open.hunk.lines.push(line.to_string());
            self.observe_content(line);
            return Ok(());
        }

        self.close_hunk();

        if line.starts_with("@@") {
            let open = parse_hunk_header(&HUNK_HEADER, line, line_no)?;
            self.open = Some(open);
            return Ok(());
        }

        self.feed_metadata(line, line_no)
    }

    fn feed_combined(&mut self, line: &str, line_no: usize) -> Result<(), DiffParseError> {
        if line.starts_with("@@@") {
            self.close_hunk();
            let open = parse_hunk_header(&COMBINED_HUNK_HEADER, line, line_no)?;
            self.open = Some(open);
            return Ok(());
        }

        if let Some(open) = self.open.as_mut() {
            if line.starts_with('\\') {
                return Ok(());
            }
            // Two origin columns, one per parent; collapse to a single marker.
            let prefix: String = line.chars().take(2).collect();
            let body: String = line.chars().skip(2).collect();
            let marker = if prefix.contains('+') {
                '+'
            } else if prefix.contains('-') {
                '-'
            } else {
                ' '
            };
            open.hunk.lines.push(format!("{marker}{body}"));
            return Ok(());
        }

        self.feed_metadata(line, line_no)
    }

    fn feed_metadata(&mut self, line: &str, line_no: usize) -> Result<(), DiffParseError> {
        if let Some(path) = line.strip_prefix("--- ") {
            self.minus_path = Some(clean_path(path, "a/"));
        } else if let Some(path) = line.strip_prefix("+++ ") {
            self.plus_path = Some(clean_path(path, "b/"));
        } else if let Some(mode) = line.strip_prefix("new file mode ") {
            self.new_file = true;
            self.submodule |= mode.trim() == SUBMODULE_MODE;
        } else if let Some(mode) = line.strip_prefix("deleted file mode ") {
            self.deleted_file = true;
            self.submodule |= mode.trim() == SUBMODULE_MODE;
        } else if let Some(mode) = line.strip_prefix("old mode ") {
            self.old_mode = Some(mode.trim().to_string());
        } else if let Some(mode) = line.strip_prefix("new mode ") {
            self.new_mode = Some(mode.trim().to_string());
        } else if let Some(path) = line.strip_prefix("rename from ") {
            self.rename_from = Some(unquote(path.trim()).to_string());
        } else if let Some(path) = line.strip_prefix("rename to ") {
            self.rename_to = Some(unquote(path.trim()).to_string());
        } else if let Some(index) = line.strip_prefix("index ") {
            self.submodule |= index.split_whitespace().nth(1) == Some(SUBMODULE_MODE);
        } else if line.starts_with("Binary files ") {
            self.binary = true;
        } else if line.starts_with("GIT binary patch") {
            self.binary = true;
            self.in_binary_payload = true;
        } else if line.starts_with(['+', '-', ' ']) {
            return Err(DiffParseError::Unparseable {
                line: line_no,
                reason: format!("content line outside of a hunk: '{}'", truncate(line)),
            });
        }
        // similarity/dissimilarity/copy headers carry nothing we record.
        Ok(())
    }

    fn observe_content(&mut self, line: &str) {
        let body = &line[1..];
        if body.starts_with("Subproject commit ") {
            self.submodule = true;
        }
        if line.starts_with('+') {
            if body.starts_with("<<<<<<< ") {
                self.conflict_markers |= MARKER_OURS;
            } else if body == "=======" {
                self.conflict_markers |= MARKER_SPLIT;
            } else if body.starts_with(">>>>>>> ") {
                self.conflict_markers |= MARKER_THEIRS;
            }
        }
    }

    fn close_hunk(&mut self) {
        if let Some(open) = self.open.take() {
            self.hunks.push(open.hunk);
        }
    }

    fn kind(&self) -> ChangeKind {
        let mode_changed = matches!(
            (&self.old_mode, &self.new_mode),
            (Some(old), Some(new)) if old != new
        );

        if self.combined || self.conflict_markers == ALL_MARKERS {
            ChangeKind::Conflict
        } else if self.submodule {
            ChangeKind::Submodule
        } else if self.new_file {
            ChangeKind::New
        } else if self.deleted_file {
            ChangeKind::Deleted
        } else if self.rename_from.is_some() || self.rename_to.is_some() {
            ChangeKind::Renamed
        } else if self.binary {
            ChangeKind::Binary
        } else if mode_changed {
            ChangeKind::ModeChanged
        } else {
            ChangeKind::Modified
        }
    }

    fn finish(mut self) -> ChangeRecord {
        self.close_hunk();
        let kind = self.kind();

        let new_side = self
            .rename_to
            .clone()
            .or_else(|| self.plus_path.clone().filter(|p| p != DEV_NULL))
            .or_else(|| self.header_new.clone());
        let old_side = self
            .rename_from
            .clone()
            .or_else(|| self.minus_path.clone().filter(|p| p != DEV_NULL))
            .or_else(|| self.header_old.clone());

        let path = match kind {
            ChangeKind::Deleted => old_side.clone().or(new_side),
            _ => new_side.or_else(|| old_side.clone()),
        }
        .unwrap_or_default();

        ChangeRecord::new(path, kind, old_side, self.hunks)
    }
}

fn parse_hunk_header(re: &Regex, line: &str, line_no: usize) -> Result<OpenHunk, DiffParseError> {
    let caps = re.captures(line).ok_or_else(|| DiffParseError::Unparseable {
        line: line_no,
        reason: format!("malformed hunk header '{}'", truncate(line)),
    })?;

    let number = |i: usize, default: u32| -> u32 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(default)
    };

    let hunk = Hunk {
        old_start: number(1, 0),
        old_lines: number(2, 1),
        new_start: number(3, 0),
        new_lines: number(4, 1),
        section: caps
            .get(5)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default(),
        lines: Vec::new(),
    };

    Ok(OpenHunk {
        old_remaining: hunk.old_lines,
        new_remaining: hunk.new_lines,
        hunk,
    })
}

/// Split `a/old b/new` from a `diff --git` header.
fn split_header_paths(rest: &str) -> (Option<String>, Option<String>) {
    let rest = rest.trim();
    if let Some(idx) = rest.rfind(" b/") {
        let old = rest[..idx].trim();
        let new = &rest[idx + 1..];
        return (
            Some(clean_path(old, "a/")),
            Some(clean_path(new, "b/")),
        );
    }
    (None, None)
}

/// Strip quoting, a trailing timestamp and the `a/`/`b/` prefix from a path.
fn clean_path(raw: &str, prefix: &str) -> String {
    let raw = raw.split('\t').next().unwrap_or(raw).trim();
    let raw = unquote(raw);
    if raw == DEV_NULL {
        return raw.to_string();
    }
    raw.strip_prefix(prefix).unwrap_or(raw).to_string()
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
}

fn truncate(line: &str) -> String {
    line.chars().take(60).collect()
}
