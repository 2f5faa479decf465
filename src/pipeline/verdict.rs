//! Draft messages and the verdicts passed on them.

use serde::{Deserialize, Serialize};

use crate::llm::extract_json;

/// A candidate commit message as produced by the Draft step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDraft {
    pub raw_text: String,
}

/// Structured draft reply.
#[derive(Debug, Deserialize)]
struct ConventionalReply {
    #[serde(rename = "type")]
    commit_type: String,
    #[serde(default)]
    scope: Option<String>,
    description: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    footer: Option<String>,
}

impl ConventionalReply {
    fn render(&self, breaking: bool) -> String {
        let mut header = self.commit_type.trim().to_string();
        if let Some(scope) = self.scope.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            header.push('(');
            header.push_str(scope);
            header.push(')');
        }
        if breaking {
            header.push('!');
        }
        header.push_str(": ");
        header.push_str(self.description.trim());

        let mut parts = vec![header];
        for section in [&self.body, &self.footer] {
            if let Some(text) = section.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
                parts.push(text.to_string());
            }
        }
        parts.join("\n\n")
    }
}

impl CommitDraft {
    /// Interpret a draft reply.
    ///
    /// A `{type, scope, description, body, footer}` object is rendered to a
    /// conventional message with `!` set from `breaking`; any other reply is
    /// kept as trimmed text.
    pub fn from_reply(reply: &str, breaking: bool) -> Self {
        let structured = extract_json(reply)
            .and_then(|json| serde_json::from_str::<ConventionalReply>(&json).ok())
            .filter(|r| !r.commit_type.trim().is_empty() && !r.description.trim().is_empty());

        let raw_text = match structured {
            Some(reply) => reply.render(breaking),
            None => reply.trim().to_string(),
        };
        Self { raw_text }
    }
}

/// Outcome of one validation. Built once and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityVerdict {
    is_acceptable: bool,
    reasons: Vec<String>,
}

impl QualityVerdict {
    /// Acceptable exactly when there are no reasons.
    pub fn new(reasons: Vec<String>) -> Self {
        Self {
            is_acceptable: reasons.is_empty(),
            reasons,
        }
    }

    pub fn is_acceptable(&self) -> bool {
        self.is_acceptable
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    /// One line per reason, or "acceptable".
    pub fn describe(&self) -> String {
        if self.is_acceptable {
            "acceptable".to_string()
        } else {
            self.reasons
                .iter()
                .map(|r| format!("- {r}"))
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}
