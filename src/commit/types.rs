//! Conventional commit types.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diff::ChangeKind;

/// The commit types quill accepts in a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitType {
    Feat,
    Fix,
    Docs,
    Refactor,
    Test,
    Chore,
    Style,
    Perf,
}

impl CommitType {
    pub const ALL: [CommitType; 8] = [
        CommitType::Feat,
        CommitType::Fix,
        CommitType::Docs,
        CommitType::Refactor,
        CommitType::Test,
        CommitType::Chore,
        CommitType::Style,
        CommitType::Perf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommitType::Feat => "feat",
            CommitType::Fix => "fix",
            CommitType::Docs => "docs",
            CommitType::Refactor => "refactor",
            CommitType::Test => "test",
            CommitType::Chore => "chore",
            CommitType::Style => "style",
            CommitType::Perf => "perf",
        }
    }

    /// Rank used to break ties when several types are equally frequent.
    /// Higher wins: feat > fix > perf > refactor > docs > test > style > chore.
    pub fn significance(&self) -> u8 {
        match self {
            CommitType::Feat => 7,
            CommitType::Fix => 6,
            CommitType::Perf => 5,
            CommitType::Refactor => 4,
            CommitType::Docs => 3,
            CommitType::Test => 2,
            CommitType::Style => 1,
            CommitType::Chore => 0,
        }
    }

    /// Exact, lowercase lookup as required in a commit header.
    pub fn from_header(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Best guess for a file when the generation service offered none.
    pub fn guess_for_path(path: &str, kind: ChangeKind) -> Self {
        let lower = path.to_lowercase();
        let file_name = Path::new(&lower)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let in_dir = |dir: &str| lower.starts_with(&format!("{dir}/")) || lower.contains(&format!("/{dir}/"));

        if in_dir("tests")
            || in_dir("test")
            || in_dir("__tests__")
            || file_name.starts_with("test_")
            || file_name.contains("_test.")
            || file_name.contains(".test.")
            || file_name.contains(".spec.")
        {
            return CommitType::Test;
        }

        if in_dir("docs")
            || in_dir("doc")
            || [".md", ".rst", ".adoc"].iter().any(|ext| file_name.ends_with(ext))
            || file_name == "license"
        {
            return CommitType::Docs;
        }

        const CHORE_FILES: &[&str] = &[
            "cargo.toml",
            "cargo.lock",
            "package.json",
            "package-lock.json",
            "yarn.lock",
            "pyproject.toml",
            "requirements.txt",
            "setup.cfg",
            "makefile",
            "dockerfile",
            ".gitignore",
            ".gitattributes",
            ".editorconfig",
        ];
        if in_dir(".github")
            || CHORE_FILES.contains(&file_name.as_str())
            || [".yml", ".yaml", ".lock"].iter().any(|ext| file_name.ends_with(ext))
        {
            return CommitType::Chore;
        }

        match kind {
            ChangeKind::New => CommitType::Feat,
            ChangeKind::Deleted | ChangeKind::Renamed => CommitType::Refactor,
            ChangeKind::Modified | ChangeKind::Conflict => CommitType::Fix,
            ChangeKind::ModeChanged | ChangeKind::Binary | ChangeKind::Submodule => {
                CommitType::Chore
            }
        }
    }
}

impl std::str::FromStr for CommitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::from_header(&lower).ok_or_else(|| format!("Unknown commit type: {}", s))
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("Feat".parse::<CommitType>(), Ok(CommitType::Feat));
        assert_eq!(" perf ".parse::<CommitType>(), Ok(CommitType::Perf));
        assert!("build".parse::<CommitType>().is_err());
    }

    #[test]
    fn test_from_header_is_exact() {
        assert_eq!(CommitType::from_header("docs"), Some(CommitType::Docs));
        assert_eq!(CommitType::from_header("Docs"), None);
    }

    #[test]
    fn test_significance_order() {
        let mut types = CommitType::ALL.to_vec();
        types.sort_by_key(|t| std::cmp::Reverse(t.significance()));
        assert_eq!(
            types,
            vec![
                CommitType::Feat,
                CommitType::Fix,
                CommitType::Perf,
                CommitType::Refactor,
                CommitType::Docs,
                CommitType::Test,
                CommitType::Style,
                CommitType::Chore,
            ]
        );
    }

    #[test]
    fn test_guess_for_path() {
        use ChangeKind::*;
        assert_eq!(CommitType::guess_for_path("tests/api_test.rs", Modified), CommitType::Test);
        assert_eq!(CommitType::guess_for_path("src/test_utils.py", New), CommitType::Test);
        assert_eq!(CommitType::guess_for_path("README.md", Modified), CommitType::Docs);
        assert_eq!(CommitType::guess_for_path("Cargo.toml", Modified), CommitType::Chore);
        assert_eq!(CommitType::guess_for_path(".github/workflows/ci.yml", New), CommitType::Chore);
        assert_eq!(CommitType::guess_for_path("src/api.py", New), CommitType::Feat);
        assert_eq!(CommitType::guess_for_path("src/api.py", Modified), CommitType::Fix);
        assert_eq!(CommitType::guess_for_path("src/old.py", Deleted), CommitType::Refactor);
        assert_eq!(CommitType::guess_for_path("run.sh", ModeChanged), CommitType::Chore);
    }

    #[test]
    fn test_serde_uses_lowercase() {
        let json = serde_json::to_string(&CommitType::Refactor).unwrap();
        assert_eq!(json, "\"refactor\"");
        let parsed: CommitType = serde_json::from_str("\"style\"").unwrap();
        assert_eq!(parsed, CommitType::Style);
    }
}
