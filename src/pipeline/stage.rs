//! Pipeline stages and the transitions between them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    FetchDiff,
    Analyze,
    Draft,
    Validate,
    Repair,
    Changelog,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::FetchDiff => "FetchDiff",
            Stage::Analyze => "Analyze",
            Stage::Draft => "Draft",
            Stage::Validate => "Validate",
            Stage::Repair => "Repair",
            Stage::Changelog => "Changelog",
        }
    }

    /// The stage that runs after this one succeeds.
    ///
    /// `transition` is only consulted after [`Stage::Validate`]; every other
    /// edge is fixed. Returns `None` after the last stage.
    pub fn next(self, transition: Option<Transition>) -> Option<Stage> {
        match self {
            Stage::FetchDiff => Some(Stage::Analyze),
            Stage::Analyze => Some(Stage::Draft),
            Stage::Draft => Some(Stage::Validate),
            Stage::Validate => match transition {
                Some(Transition::Repair) => Some(Stage::Repair),
                Some(Transition::Finalize) | None => Some(Stage::Changelog),
            },
            Stage::Repair => Some(Stage::Validate),
            Stage::Changelog => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where control goes after a draft has been judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Transition {
    Repair,
    Finalize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_edges() {
        assert_eq!(Stage::FetchDiff.next(None), Some(Stage::Analyze));
        assert_eq!(Stage::Analyze.next(None), Some(Stage::Draft));
        assert_eq!(Stage::Draft.next(None), Some(Stage::Validate));
        assert_eq!(Stage::Repair.next(None), Some(Stage::Validate));
        assert_eq!(Stage::Changelog.next(None), None);
    }

    #[test]
    fn test_validate_branches_on_transition() {
        assert_eq!(
            Stage::Validate.next(Some(Transition::Repair)),
            Some(Stage::Repair)
        );
        assert_eq!(
            Stage::Validate.next(Some(Transition::Finalize)),
            Some(Stage::Changelog)
        );
    }
}
