use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, info};

use crate::diff::{ChangeRecord, parse_diff};
use crate::error::{GenerationError, PipelineErrorKind};
use crate::llm::{Generator, parse_reply};
use crate::pipeline::analysis::{DiffAnalysis, FileAssessment};
use crate::pipeline::prompt::file_purpose_request;
use crate::pipeline::state::{EntryKind, PipelineState, Role};

/// Parse the latest staged diff and describe every file in it.
///
/// Up to `concurrency` file-purpose requests run at once; results keep diff
/// order. The first failed or unparseable reply fails the step.
pub async fn analyze<G: Generator + ?Sized>(
    state: &mut PipelineState,
    generator: &G,
    concurrency: usize,
) -> Result<(), PipelineErrorKind> {
    let diff = state
        .latest(EntryKind::StagedDiff)
        .map(|e| e.content.clone())
        .ok_or(PipelineErrorKind::MissingInput("staged diff"))?;

    let records = parse_diff(&diff)?;
    info!(files = records.len(), "Analyzing staged files");

    let assessments: Vec<FileAssessment> = stream::iter(records.iter())
        .map(|record| assess_file(record, generator))
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    let analysis = DiffAnalysis::from_assessments(records, assessments)?;
    debug!(
        change_type = %analysis.change_type,
        breaking = analysis.breaking_change,
        "Analysis complete"
    );

    state.record(Role::Assistant, EntryKind::Analysis, analysis.summary.clone());
    state.analysis = Some(analysis);
    Ok(())
}

async fn assess_file<G: Generator + ?Sized>(
    record: &ChangeRecord,
    generator: &G,
) -> Result<FileAssessment, GenerationError> {
    let request = file_purpose_request(record);
    let reply = generator.generate(&request).await?;
    let assessment: FileAssessment = parse_reply(&reply)?;
    debug!(path = record.path(), purpose = %assessment.purpose, "Assessed file");
    Ok(assessment)
}
