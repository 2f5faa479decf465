//! Structural checks for conventional commit messages.
//!
//! Everything here is pure: the same message always produces the same
//! reasons, in the same order.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::commit::types::CommitType;

/// Hard ceiling on the whole message, subject and body included.
pub const MAX_MESSAGE_CHARS: usize = 200;

/// Anything shaped like `word(scope)!: rest`, used to pull the type out even
/// when the header is otherwise malformed.
static LOOSE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^\s(:!]+)(\([^)]*\))?(!)?:\s*(.*)$").expect("Invalid regex")
});

static STRICT_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(feat|fix|docs|refactor|test|chore|style|perf)(\([A-Za-z0-9_./-]+\))?!?: \S.*$")
        .expect("Invalid regex")
});

/// Words ending in "ed" that are not past tense. Prefixed forms such as
/// "reseed" or "unembed" match too.
const NOT_PAST_TENSE: &[&str] = &[
    "embed", "proceed", "exceed", "succeed", "feed", "seed", "need", "speed", "shred", "bleed",
    "breed",
];

const IRREGULAR_PAST: &[&str] = &[
    "made", "wrote", "built", "broke", "took", "gave", "found", "went", "did", "began", "chose",
    "drew", "kept", "sent", "brought", "bought", "caught", "taught", "thought", "understood",
];

/// Check `message` against the conventional commit header rules.
///
/// Returns the violated rules as human-readable reasons; an empty vector
/// means the message is structurally acceptable.
pub fn check_structure(message: &str) -> Vec<String> {
    let message = message.trim();
    let mut reasons = Vec::new();
    let subject = message.lines().next().unwrap_or("").trim_end();

    match LOOSE_HEADER.captures(subject) {
        None => reasons.push(
            "Subject line must follow `type(scope): description`, e.g. `fix(api): handle empty body`"
                .to_string(),
        ),
        Some(caps) => {
            let ty = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            if CommitType::from_header(ty).is_none() {
                reasons.push(format!(
                    "Type `{}` is not one of: {}",
                    ty,
                    allowed_types().join(", ")
                ));
            } else if !STRICT_HEADER.is_match(subject) {
                reasons.push(
                    "Header must be `type(scope)!: description` with a single space after the colon and a non-empty description"
                        .to_string(),
                );
            }

            let description = caps.get(4).map(|m| m.as_str()).unwrap_or("");
            if let Some(word) = first_word(description) {
                if word.chars().next().is_some_and(char::is_uppercase) {
                    reasons.push(format!(
                        "Description must start with a lowercase word, found `{word}`"
                    ));
                }
                if is_past_tense(word) {
                    reasons.push(format!(
                        "Description must use the imperative mood (`add`, not `added`), found `{word}`"
                    ));
                }
            }
            if description.trim_end().ends_with('.') {
                reasons.push("Subject line must not end with a period".to_string());
            }
        }
    }

    let length = message.chars().count();
    if length > MAX_MESSAGE_CHARS {
        reasons.push(format!(
            "Message is {length} characters; the limit is {MAX_MESSAGE_CHARS}"
        ));
    }

    reasons
}

fn allowed_types() -> Vec<&'static str> {
    CommitType::ALL.iter().map(CommitType::as_str).collect()
}

fn first_word(description: &str) -> Option<&str> {
    description
        .split_whitespace()
        .next()
        .map(|w| w.trim_end_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
}

fn is_past_tense(word: &str) -> bool {
    let lower = word.to_lowercase();
    if IRREGULAR_PAST.contains(&lower.as_str()) {
        return true;
    }
    lower.ends_with("ed")
        && lower.chars().count() > 4
        && !NOT_PAST_TENSE.iter().any(|w| lower.ends_with(w))
}
