use chrono::NaiveDate;
use tracing::debug;

use crate::changelog::render_section;
use crate::error::PipelineErrorKind;
use crate::pipeline::state::{EntryKind, PipelineState, Role};

/// Render the changelog section for the final message.
///
/// Persisting the section is left to the caller.
pub fn changelog(state: &mut PipelineState, date: NaiveDate) -> Result<String, PipelineErrorKind> {
    let analysis = state
        .analysis
        .as_ref()
        .ok_or(PipelineErrorKind::MissingInput("analysis"))?;
    let message = state
        .final_message
        .as_deref()
        .ok_or(PipelineErrorKind::MissingInput("commit message"))?;

    let section = render_section(analysis, message, date);
    debug!(bytes = section.len(), "Rendered changelog section");

    state.record(Role::System, EntryKind::Changelog, section.clone());
    Ok(section)
}
