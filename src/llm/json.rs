//! Pulling structured replies out of free-form service output.
//!
//! Models asked for JSON still wrap it in code fences or add a sentence
//! before or after. The first JSON object found wins, with fenced blocks
//! checked before the surrounding text.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::GenerationError;

/// Longest slice of a bad reply quoted back in an error.
const SNIPPET_CHARS: usize = 200;

/// Find the first JSON object in `response`, normalized to compact form.
pub fn extract_json(response: &str) -> Option<String> {
    let trimmed = response.trim();

    for block in fenced_blocks(trimmed) {
        if let Some(object) = first_object(block) {
            return Some(object);
        }
    }

    first_object(trimmed)
}

/// Extract and deserialize a structured reply.
pub fn parse_reply<T: DeserializeOwned>(response: &str) -> Result<T, GenerationError> {
    let json = extract_json(response).ok_or_else(|| {
        GenerationError::MalformedResponse(format!(
            "no JSON object in reply: {}",
            snippet(response)
        ))
    })?;

    serde_json::from_str(&json).map_err(|e| {
        GenerationError::MalformedResponse(format!("{e} in reply: {}", snippet(&json)))
    })
}

/// Contents of each ```` ``` ```` fenced block, minus any language tag.
fn fenced_blocks(text: &str) -> Vec<&str> {
    text.split("```")
        .skip(1)
        .step_by(2)
        .map(|block| {
            let block = block.strip_prefix("json").unwrap_or(block);
            block.trim()
        })
        .collect()
}

/// Try every `{` in order; serde's stream reader stops at the end of the
/// first complete value, so trailing prose is ignored.
fn first_object(text: &str) -> Option<String> {
    for (start, _) in text.match_indices('{') {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        if let Some(Ok(value @ Value::Object(_))) = stream.next() {
            return Some(value.to_string());
        }
    }
    None
}

fn snippet(text: &str) -> String {
    text.chars().take(SNIPPET_CHARS).collect()
}
