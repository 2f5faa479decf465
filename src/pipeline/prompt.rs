//! Requests sent to the generation service by each step.
//!
//! Prompt wording carries no contract; the JSON schemas do.

use serde_json::{Value, json};

use crate::commit::{CommitType, MAX_MESSAGE_CHARS};
use crate::diff::ChangeRecord;
use crate::llm::{GenerationRequest, PromptKind};
use crate::pipeline::analysis::DiffAnalysis;

/// Longest per-file diff excerpt included in a file-purpose prompt.
pub const MAX_FILE_DIFF_CHARS: usize = 6_000;

fn type_names() -> Vec<&'static str> {
    CommitType::ALL.iter().map(CommitType::as_str).collect()
}

fn rules() -> String {
    format!(
        "- Header format: type(scope)!: description (scope and ! are optional)
- type is one of: {}
- description starts with a lowercase verb in the imperative mood (\"add\", not \"added\" or \"Adds\")
- no period at the end of the header
- header ideally at most 50 characters
- whole message at most {} characters",
        type_names().join(", "),
        MAX_MESSAGE_CHARS
    )
}

/// Ask for the purpose of one changed file.
pub fn file_purpose_request(record: &ChangeRecord) -> GenerationRequest {
    let rename = record
        .old_path()
        .map(|old| format!(" (renamed from {old})"))
        .unwrap_or_default();

    let diff = if record.hunks().is_empty() {
        "(no textual diff)".to_string()
    } else {
        sanitize_for_prompt(&record.hunk_text(), MAX_FILE_DIFF_CHARS)
    };

    let prompt = format!(
        "Describe the purpose of this change to a single file.

File: {path}
Change: {kind}{rename}
Lines: +{added} -{removed}

Diff:
{diff}

Reply with a JSON object:
- \"purpose\": one short sentence describing what the change does
- \"change_type\": the conventional commit type that fits best, one of {types}
- \"breaking\": true only if the change breaks a public interface",
        path = record.path(),
        kind = record.change_kind(),
        added = record.added_lines(),
        removed = record.removed_lines(),
        types = type_names().join(", "),
    );

    GenerationRequest::structured(
        PromptKind::FilePurpose,
        prompt,
        json!({
            "type": "object",
            "properties": {
                "purpose": {"type": "string"},
                "change_type": {"type": "string", "enum": type_names()},
                "breaking": {"type": "boolean"}
            },
            "required": ["purpose", "change_type", "breaking"]
        }),
    )
}

/// Ask for a first commit message draft.
pub fn draft_request(analysis: &DiffAnalysis, scopes: &[String]) -> GenerationRequest {
    let files = analysis
        .files
        .iter()
        .map(|f| format!("- {} ({}): {}", f.path(), f.change_kind(), f.purpose()))
        .collect::<Vec<_>>()
        .join("\n");

    let scope_line = if scopes.is_empty() {
        "Suggested scope: none".to_string()
    } else {
        format!("Suggested scopes: {}", scopes.join(", "))
    };

    let breaking = if analysis.breaking_change {
        "This is a BREAKING change: mark the header with ! and add a footer starting with \"BREAKING CHANGE:\"."
    } else {
        "This is not a breaking change."
    };

    let prompt = format!(
        "Write a conventional commit message for the staged changes below.

Summary: {summary}
Dominant type: {ty}
{breaking}
{scope_line}

Files:
{files}

Rules:
{rules}

Reply with a JSON object with \"type\", \"scope\", \"description\", \"body\" and \"footer\". Use an empty string for parts you leave out.",
        summary = analysis.summary,
        ty = analysis.change_type,
        rules = rules(),
    );

    GenerationRequest::structured(PromptKind::DraftMessage, prompt, draft_schema())
}

fn draft_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "type": {"type": "string", "enum": type_names()},
            "scope": {"type": "string"},
            "description": {"type": "string"},
            "body": {"type": "string"},
            "footer": {"type": "string"}
        },
        "required": ["type", "description"]
    })
}

/// Ask the service to judge a message against the rules.
pub fn validate_request(message: &str) -> GenerationRequest {
    let prompt = format!(
        "Check whether this commit message follows the rules. Do not be overly strict: \
only report clear violations.

Message:
{message}

Rules:
{rules}

Reply with a JSON object: \"is_valid\" (boolean) and \"reasons\" (a list of violated rules, empty when valid).",
        message = sanitize_for_prompt(message, MAX_FILE_DIFF_CHARS),
        rules = rules(),
    );

    GenerationRequest::structured(
        PromptKind::ValidateMessage,
        prompt,
        json!({
            "type": "object",
            "properties": {
                "is_valid": {"type": "boolean"},
                "reasons": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["is_valid", "reasons"]
        }),
    )
}

/// Ask for a corrected message given the reasons it was rejected.
pub fn repair_request(
    message: &str,
    reasons: &[String],
    analysis: Option<&DiffAnalysis>,
) -> GenerationRequest {
    let reasons = reasons
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {}", i + 1, r))
        .collect::<Vec<_>>()
        .join("\n");

    let context = analysis
        .map(|a| format!("\nWhat the change does: {}\n", a.summary))
        .unwrap_or_default();

    let prompt = format!(
        "This commit message was rejected.

Message:
{message}

Problems:
{reasons}
{context}
Rules:
{rules}

Return only the corrected commit message, with no explanation and no code fences.",
        message = sanitize_for_prompt(message, MAX_FILE_DIFF_CHARS),
        rules = rules(),
    );

    GenerationRequest::text(PromptKind::RepairMessage, prompt)
}

/// Strip terminal escapes and control characters, defuse code fences and
/// cap the length of text taken from the repository.
pub fn sanitize_for_prompt(text: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(text.len().min(max_chars));
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            // CSI sequences run to a final byte in '@'..='~'; other escapes are two chars.
            if chars.peek() == Some(&'[') {
                chars.next();
                for next in chars.by_ref() {
                    if ('@'..='~').contains(&next) {
                        break;
                    }
                }
            } else {
                chars.next();
            }
            continue;
        }
        if c.is_control() && c != '\n' && c != '\t' {
            continue;
        }
        out.push(c);
    }

    let out = out.replace("```", "'''");
    if out.chars().count() <= max_chars {
        return out;
    }
    let mut truncated: String = out.chars().take(max_chars).collect();
    truncated.push_str("\n[... diff truncated ...]");
    truncated
}
