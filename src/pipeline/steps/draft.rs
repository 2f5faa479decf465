use tracing::debug;

use crate::commit::scope_hints;
use crate::error::{GenerationError, PipelineErrorKind};
use crate::llm::Generator;
use crate::pipeline::prompt::draft_request;
use crate::pipeline::state::{EntryKind, PipelineState, Role};
use crate::pipeline::verdict::CommitDraft;

/// Produce the first candidate message and reset the repair counter.
pub async fn draft<G: Generator + ?Sized>(
    state: &mut PipelineState,
    generator: &G,
) -> Result<(), PipelineErrorKind> {
    let analysis = state
        .analysis
        .as_ref()
        .ok_or(PipelineErrorKind::MissingInput("analysis"))?;

    let paths: Vec<&str> = analysis.files.iter().map(|f| f.path()).collect();
    let scopes = scope_hints(&paths);
    let request = draft_request(analysis, &scopes);

    let reply = generator.generate(&request).await?;
    let draft = CommitDraft::from_reply(&reply, analysis.breaking_change);
    if draft.raw_text.is_empty() {
        return Err(GenerationError::MalformedResponse("empty draft".to_string()).into());
    }

    debug!(scopes = ?scopes, "Drafted commit message");
    state.attempts = 0;
    state.final_message = Some(draft.raw_text.clone());
    state.record(Role::Assistant, EntryKind::Draft, draft.raw_text);
    Ok(())
}
