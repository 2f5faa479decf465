//! Aggregating per-file assessments into one [`DiffAnalysis`].

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::commit::CommitType;
use crate::diff::{ChangeKind, ChangeRecord};
use crate::error::DiffParseError;

/// The generation service's reply about one file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileAssessment {
    pub purpose: String,
    #[serde(default)]
    pub change_type: Option<String>,
    #[serde(default)]
    pub breaking: bool,
}

/// Aggregate description of the staged change set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffAnalysis {
    pub summary: String,
    pub change_type: CommitType,
    pub breaking_change: bool,
    /// Never empty; in diff order.
    pub files: Vec<ChangeRecord>,
}

impl DiffAnalysis {
    /// Combine parsed records with one assessment per record.
    ///
    /// Each record's purpose is filled from its assessment. The dominant type
    /// is the most frequent per-file type, with ties going to the more
    /// significant type.
    pub fn from_assessments(
        mut files: Vec<ChangeRecord>,
        assessments: Vec<FileAssessment>,
    ) -> Result<Self, DiffParseError> {
        if files.is_empty() {
            return Err(DiffParseError::Empty);
        }

        let mut counts: HashMap<CommitType, usize> = HashMap::new();
        let mut breaking_change = false;

        for (record, assessment) in files.iter_mut().zip(&assessments) {
            let ty = assessment
                .change_type
                .as_deref()
                .and_then(|t| t.parse::<CommitType>().ok())
                .unwrap_or_else(|| CommitType::guess_for_path(record.path(), record.change_kind()));
            *counts.entry(ty).or_default() += 1;

            breaking_change |= assessment.breaking;

            let purpose = assessment.purpose.trim();
            if purpose.is_empty() {
                record.set_purpose(format!("{} file", record.change_kind().as_str().to_lowercase()));
            } else {
                record.set_purpose(purpose);
            }
        }

        breaking_change |= files
            .iter()
            .any(|f| f.change_kind() == ChangeKind::Deleted && is_public_interface(f.path()));

        let change_type = counts
            .into_iter()
            .max_by_key(|(ty, count)| (*count, ty.significance()))
            .map(|(ty, _)| ty)
            .unwrap_or(CommitType::Chore);

        let summary = summarize(&files, change_type, breaking_change);

        Ok(Self {
            summary,
            change_type,
            breaking_change,
            files,
        })
    }

    pub fn total_added(&self) -> usize {
        self.files.iter().map(ChangeRecord::added_lines).sum()
    }

    pub fn total_removed(&self) -> usize {
        self.files.iter().map(ChangeRecord::removed_lines).sum()
    }
}

/// Paths whose removal is treated as a breaking change.
pub fn is_public_interface(path: &str) -> bool {
    let lower = path.to_lowercase();
    let p = Path::new(&lower);
    let file_name = p
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = p
        .file_stem()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    matches!(file_name.as_str(), "lib.rs" | "mod.rs" | "__init__.py")
        || stem == "index"
        || lower.split('/').rev().skip(1).any(|dir| dir == "api" || dir == "include")
}

/// Deterministic one-paragraph overview: counts, kinds, type, then purposes.
fn summarize(files: &[ChangeRecord], change_type: CommitType, breaking: bool) -> String {
    let added: usize = files.iter().map(ChangeRecord::added_lines).sum();
    let removed: usize = files.iter().map(ChangeRecord::removed_lines).sum();

    let mut kinds: Vec<(ChangeKind, usize)> = Vec::new();
    for kind in ChangeKind::ALL {
        let n = files.iter().filter(|f| f.change_kind() == kind).count();
        if n > 0 {
            kinds.push((kind, n));
        }
    }
    let kinds = kinds
        .iter()
        .map(|(kind, n)| format!("{} {}", n, kind.as_str().to_lowercase().replace('_', " ")))
        .collect::<Vec<_>>()
        .join(", ");

    let purposes = files
        .iter()
        .map(|f| f.purpose().trim_end_matches('.').to_string())
        .collect::<Vec<_>>()
        .join("; ");

    let mut summary = format!(
        "{} {} changed, {} {}(+), {} {}(-) ({}). Dominant change type: {}.",
        files.len(),
        plural(files.len(), "file", "files"),
        added,
        plural(added, "insertion", "insertions"),
        removed,
        plural(removed, "deletion", "deletions"),
        kinds,
        change_type
    );
    if breaking {
        summary.push_str(" Contains a breaking change.");
    }
    summary.push_str(&format!(" Changes: {purposes}."));
    summary
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 { one } else { many }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::Hunk;

    fn record(path: &str, kind: ChangeKind, added: usize, removed: usize) -> ChangeRecord {
        let mut lines: Vec<String> = (0..added).map(|i| format!("+a{i}")).collect();
        lines.extend((0..removed).map(|i| format!("-r{i}")));
        let hunk = Hunk {
            old_start: 1,
            old_lines: removed as u32,
            new_start: 1,
            new_lines: added as u32,
            section: String::new(),
            lines,
        };
        ChangeRecord::new(path, kind, None, vec![hunk])
    }

    fn assessment(purpose: &str, ty: Option<&str>, breaking: bool) -> FileAssessment {
        FileAssessment {
            purpose: purpose.to_string(),
            change_type: ty.map(str::to_string),
            breaking,
        }
    }

    #[test]
    fn test_single_file_analysis() {
        let analysis = DiffAnalysis::from_assessments(
            vec![record("src/api.py", ChangeKind::Modified, 10, 2)],
            vec![assessment("Add pagination to the list endpoint.", Some("feat"), false)],
        )
        .unwrap();

        assert_eq!(analysis.change_type, CommitType::Feat);
        assert!(!analysis.breaking_change);
        assert_eq!(analysis.files.len(), 1);
        assert_eq!(analysis.files[0].purpose(), "Add pagination to the list endpoint.");
        assert_eq!(analysis.total_added(), 10);
        assert_eq!(analysis.total_removed(), 2);
        assert_eq!(
            analysis.summary,
            "1 file changed, 10 insertions(+), 2 deletions(-) (1 modified). \
             Dominant change type: feat. Changes: Add pagination to the list endpoint."
        );
    }

    #[test]
    fn test_most_frequent_type_wins() {
        let analysis = DiffAnalysis::from_assessments(
            vec![
                record("a.rs", ChangeKind::Modified, 1, 0),
                record("b.rs", ChangeKind::Modified, 1, 0),
                record("c.rs", ChangeKind::Modified, 1, 0),
            ],
            vec![
                assessment("x", Some("fix"), false),
                assessment("y", Some("feat"), false),
                assessment("z", Some("fix"), false),
            ],
        )
        .unwrap();
        assert_eq!(analysis.change_type, CommitType::Fix);
    }

    #[test]
    fn test_ties_break_by_significance() {
        let analysis = DiffAnalysis::from_assessments(
            vec![
                record("a.rs", ChangeKind::Modified, 1, 0),
                record("README.md", ChangeKind::Modified, 1, 0),
            ],
            vec![
                assessment("x", Some("chore"), false),
                assessment("y", Some("docs"), false),
            ],
        )
        .unwrap();
        assert_eq!(analysis.change_type, CommitType::Docs);
    }

    #[test]
    fn test_missing_or_unknown_type_uses_path_guess() {
        let analysis = DiffAnalysis::from_assessments(
            vec![record("docs/guide.md", ChangeKind::Modified, 3, 1)],
            vec![assessment("Explain setup", Some("documentation"), false)],
        )
        .unwrap();
        assert_eq!(analysis.change_type, CommitType::Docs);
    }

    #[test]
    fn test_breaking_from_any_file_flag() {
        let analysis = DiffAnalysis::from_assessments(
            vec![
                record("a.rs", ChangeKind::Modified, 1, 0),
                record("b.rs", ChangeKind::Modified, 1, 0),
            ],
            vec![
                assessment("x", Some("feat"), false),
                assessment("y", Some("feat"), true),
            ],
        )
        .unwrap();
        assert!(analysis.breaking_change);
        assert!(analysis.summary.contains("breaking change"));
    }

    #[test]
    fn test_deleted_public_interface_is_breaking() {
        let analysis = DiffAnalysis::from_assessments(
            vec![record("src/api/users.py", ChangeKind::Deleted, 0, 40)],
            vec![assessment("Remove users endpoint", Some("refactor"), false)],
        )
        .unwrap();
        assert!(analysis.breaking_change);
    }

    #[test]
    fn test_deleted_private_file_is_not_breaking() {
        let analysis = DiffAnalysis::from_assessments(
            vec![record("scripts/tmp.sh", ChangeKind::Deleted, 0, 4)],
            vec![assessment("Remove script", None, false)],
        )
        .unwrap();
        assert!(!analysis.breaking_change);
    }

    #[test]
    fn test_public_interface_paths() {
        assert!(is_public_interface("src/lib.rs"));
        assert!(is_public_interface("pkg/__init__.py"));
        assert!(is_public_interface("web/index.ts"));
        assert!(is_public_interface("include/quill.h"));
        assert!(!is_public_interface("src/api.py"));
        assert!(!is_public_interface("src/internal/util.rs"));
    }

    #[test]
    fn test_blank_purpose_gets_placeholder() {
        let analysis = DiffAnalysis::from_assessments(
            vec![record("logo.png", ChangeKind::Binary, 0, 0)],
            vec![assessment("  ", None, false)],
        )
        .unwrap();
        assert_eq!(analysis.files[0].purpose(), "binary file");
    }

    #[test]
    fn test_zero_records_is_empty_error() {
        let result = DiffAnalysis::from_assessments(Vec::new(), Vec::new());
        assert_eq!(result, Err(DiffParseError::Empty));
    }
}
