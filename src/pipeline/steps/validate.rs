use serde::Deserialize;
use tracing::{debug, info};

use crate::commit::check_structure;
use crate::error::PipelineErrorKind;
use crate::llm::{Generator, parse_reply};
use crate::pipeline::prompt::validate_request;
use crate::pipeline::stage::Transition;
use crate::pipeline::state::{EntryKind, PipelineState, Role};
use crate::pipeline::verdict::QualityVerdict;

const GENERIC_REJECTION: &str = "Rejected by semantic review without a specific reason";

#[derive(Debug, Deserialize)]
struct SemanticReply {
    is_valid: bool,
    #[serde(default)]
    reasons: Vec<String>,
}

/// Judge the current message and decide whether to repair it.
///
/// Structural checks always run. When `semantic` is set the generation
/// service is also asked, and its reasons are merged only if it rejected the
/// message.
pub async fn validate<G: Generator + ?Sized>(
    state: &mut PipelineState,
    generator: &G,
    semantic: bool,
    max_attempts: u32,
) -> Result<Transition, PipelineErrorKind> {
    let message = state
        .final_message
        .clone()
        .ok_or(PipelineErrorKind::MissingInput("commit message"))?;

    let mut reasons = check_structure(&message);

    if semantic {
        let reply = generator.generate(&validate_request(&message)).await?;
        let review: SemanticReply = parse_reply(&reply)?;
        if !review.is_valid {
            for reason in review.reasons {
                let reason = reason.trim().to_string();
                if !reason.is_empty() && !reasons.contains(&reason) {
                    reasons.push(reason);
                }
            }
            if reasons.is_empty() {
                reasons.push(GENERIC_REJECTION.to_string());
            }
        }
    }

    let verdict = QualityVerdict::new(reasons);
    let transition = next_transition(&verdict, state.attempts, max_attempts);
    debug!(
        acceptable = verdict.is_acceptable(),
        attempts = state.attempts,
        ?transition,
        "Validated commit message"
    );
    if !verdict.is_acceptable() && transition == Transition::Finalize {
        info!(attempts = state.attempts, "Repair budget exhausted, keeping current message");
    }

    state.record(Role::System, EntryKind::Verdict, verdict.describe());
    state.last_verdict = Some(verdict);
    Ok(transition)
}

/// Repair while the message is rejected and attempts remain.
pub fn next_transition(verdict: &QualityVerdict, attempts: u32, max_attempts: u32) -> Transition {
    if !verdict.is_acceptable() && attempts < max_attempts {
        Transition::Repair
    } else {
        Transition::Finalize
    }
}
