use tracing::debug;

use crate::error::{GenerationError, PipelineErrorKind};
use crate::llm::Generator;
use crate::pipeline::prompt::repair_request;
use crate::pipeline::state::{EntryKind, PipelineState, Role};

/// Ask for a corrected message using the reasons from the last verdict.
///
/// The counter is bumped before the request so a failed repair still counts.
pub async fn repair<G: Generator + ?Sized>(
    state: &mut PipelineState,
    generator: &G,
) -> Result<(), PipelineErrorKind> {
    let message = state
        .final_message
        .clone()
        .ok_or(PipelineErrorKind::MissingInput("commit message"))?;
    let reasons = state
        .last_verdict
        .as_ref()
        .map(|v| v.reasons().to_vec())
        .unwrap_or_default();

    state.attempts += 1;
    debug!(attempt = state.attempts, reasons = reasons.len(), "Repairing commit message");

    let request = repair_request(&message, &reasons, state.analysis.as_ref());
    let reply = generator.generate(&request).await?;
    let revised = strip_fences(&reply);
    if revised.is_empty() {
        return Err(GenerationError::MalformedResponse("empty repair".to_string()).into());
    }

    state.final_message = Some(revised.clone());
    state.record(Role::Assistant, EntryKind::Repair, revised);
    Ok(())
}

/// Trim the reply and drop a code fence wrapped around the whole of it.
fn strip_fences(reply: &str) -> String {
    let trimmed = reply.trim();
    if let Some(inner) = trimmed.strip_prefix("```")
        && let Some(inner) = inner.strip_suffix("```")
    {
        // Drop an info string such as "text" on the opening fence line.
        let body = match inner.split_once('\n') {
            Some((first, rest)) if !first.trim().contains(' ') => rest,
            _ => inner,
        };
        return body.trim().to_string();
    }
    trimmed.to_string()
}
