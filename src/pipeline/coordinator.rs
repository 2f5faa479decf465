//! Runs the step graph for one staged change set.

use chrono::{Local, NaiveDate};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineErrorKind};
use crate::git::DiffSource;
use crate::llm::Generator;
use crate::pipeline::analysis::DiffAnalysis;
use crate::pipeline::stage::{Stage, Transition};
use crate::pipeline::state::PipelineState;
use crate::pipeline::steps;
use crate::pipeline::verdict::QualityVerdict;

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub final_message: String,
    pub analysis: DiffAnalysis,
    /// Repairs performed after the draft.
    pub attempts: u32,
    /// Verdict on `final_message`.
    pub verdict: QualityVerdict,
    /// Rendered changelog section, not yet persisted.
    pub changelog: String,
    pub state: PipelineState,
}

impl PipelineOutcome {
    /// True when the repair budget ran out before the message was accepted.
    pub fn exhausted(&self) -> bool {
        !self.verdict.is_acceptable()
    }

    /// Reasons still standing against the final message.
    pub fn warnings(&self) -> &[String] {
        self.verdict.reasons()
    }
}

/// Owns the collaborators and drives FetchDiff through Changelog.
pub struct Coordinator<S, G> {
    source: S,
    generator: G,
    config: PipelineConfig,
    cancel: CancellationToken,
    date: Option<NaiveDate>,
}

impl<S: DiffSource, G: Generator> Coordinator<S, G> {
    pub fn new(source: S, generator: G, config: PipelineConfig) -> Self {
        Self {
            source,
            generator,
            config,
            cancel: CancellationToken::new(),
            date: None,
        }
    }

    /// Use an externally owned token, e.g. one cancelled on Ctrl-C.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fix the date stamped on the changelog section. Defaults to today.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage with a fresh state.
    ///
    /// Cancellation is checked before each stage; a request already sent to
    /// the generation service is allowed to finish.
    pub async fn run(&self) -> Result<PipelineOutcome, PipelineError> {
        let mut state = PipelineState::new();
        let mut stage = Stage::FetchDiff;
        let mut changelog = None;

        loop {
            if self.cancel.is_cancelled() {
                return Err(fail(stage, PipelineErrorKind::Cancelled, state));
            }
            info!(%stage, attempts = state.attempts, "Running stage");

            let transition = match self.step(stage, &mut state, &mut changelog).await {
                Ok(transition) => transition,
                Err(kind) => return Err(fail(stage, kind, state)),
            };

            match stage.next(transition) {
                Some(next) => stage = next,
                None => break,
            }
        }

        match finish(&state, changelog) {
            Ok(outcome) => Ok(outcome),
            Err(kind) => Err(fail(Stage::Changelog, kind, state)),
        }
    }

    async fn step(
        &self,
        stage: Stage,
        state: &mut PipelineState,
        changelog: &mut Option<String>,
    ) -> Result<Option<Transition>, PipelineErrorKind> {
        match stage {
            Stage::FetchDiff => steps::fetch_diff(state, &self.source)?,
            Stage::Analyze => {
                steps::analyze(state, &self.generator, self.config.analysis_concurrency).await?
            }
            Stage::Draft => steps::draft(state, &self.generator).await?,
            Stage::Validate => {
                let transition = steps::validate(
                    state,
                    &self.generator,
                    self.config.semantic_validation,
                    self.config.max_repair_attempts,
                )
                .await?;
                return Ok(Some(transition));
            }
            Stage::Repair => steps::repair(state, &self.generator).await?,
            Stage::Changelog => {
                let date = self.date.unwrap_or_else(|| Local::now().date_naive());
                *changelog = Some(steps::changelog(state, date)?);
            }
        }
        Ok(None)
    }
}

fn fail(stage: Stage, kind: PipelineErrorKind, mut state: PipelineState) -> PipelineError {
    warn!(%stage, error = %kind, "Stage failed");
    state.record_error(stage, kind.to_string());
    PipelineError {
        stage,
        kind,
        state: Box::new(state),
    }
}

fn finish(
    state: &PipelineState,
    changelog: Option<String>,
) -> Result<PipelineOutcome, PipelineErrorKind> {
    let final_message = state
        .final_message
        .clone()
        .ok_or(PipelineErrorKind::MissingInput("commit message"))?;
    let analysis = state
        .analysis
        .clone()
        .ok_or(PipelineErrorKind::MissingInput("analysis"))?;
    let verdict = state
        .last_verdict
        .clone()
        .ok_or(PipelineErrorKind::MissingInput("verdict"))?;
    let changelog = changelog.ok_or(PipelineErrorKind::MissingInput("changelog section"))?;

    if !verdict.is_acceptable() {
        warn!(
            attempts = state.attempts,
            reasons = verdict.reasons().len(),
            "Finalized a message that still fails validation"
        );
    }

    Ok(PipelineOutcome {
        final_message,
        analysis,
        attempts: state.attempts,
        verdict,
        changelog,
        state: state.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::CommitType;
    use crate::error::{GenerationError, GitError};
    use crate::git::staged::MockDiffSource;
    use crate::llm::PromptKind;
    use crate::llm::generator::MockGenerator;
    use crate::pipeline::state::EntryKind;

    const API_DIFF: &str = "\
diff --git a/src/api.py b/src/api.py
index 1111111..2222222 100644
--- a/src/api.py
+++ b/src/api.py
@@ -1,3 +1,11 @@
 def list_items(request):
-    items = Item.all()
-    return items
+    page = int(request.args.get(\"page\", 1))
+    size = int(request.args.get(\"size\", 50))
+    items = Item.all()
+    start = (page - 1) * size
+    end = start + size
+    return {
+        \"items\": items[start:end],
+        \"page\": page,
+        \"size\": size,
+    }
";

    const PURPOSE: &str =
        r#"{"purpose": "Add pagination to the list endpoint", "change_type": "feat", "breaking": false}"#;
    const VALID: &str = r#"{"is_valid": true, "reasons": []}"#;

    fn source(diff: &'static str) -> MockDiffSource {
        let mut source = MockDiffSource::new();
        source
            .expect_staged_diff()
            .times(1)
            .returning(move || Ok(diff.to_string()));
        source
    }

    fn scripted(draft: &'static str, review: &'static str, repair: &'static str) -> MockGenerator {
        let mut generator = MockGenerator::new();
        generator.expect_generate().returning(move |req| {
            Ok(match req.kind {
                PromptKind::FilePurpose => PURPOSE,
                PromptKind::DraftMessage => draft,
                PromptKind::ValidateMessage => review,
                PromptKind::RepairMessage => repair,
            }
            .to_string())
        });
        generator
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn kinds(state: &PipelineState) -> Vec<EntryKind> {
        state.transcript().iter().map(|e| e.kind).collect()
    }

    #[tokio::test]
    async fn test_api_pagination_scenario() {
        let generator = scripted(
            r#"{"type": "feat", "scope": "api", "description": "add pagination to list endpoint"}"#,
            VALID,
            "",
        );
        let coordinator = Coordinator::new(source(API_DIFF), generator, PipelineConfig::default())
            .with_date(date());

        let outcome = coordinator.run().await.unwrap();

        assert_eq!(outcome.final_message, "feat(api): add pagination to list endpoint");
        assert_eq!(outcome.attempts, 0);
        assert!(outcome.verdict.is_acceptable());
        assert!(!outcome.exhausted());

        assert_eq!(outcome.analysis.files.len(), 1);
        let file = &outcome.analysis.files[0];
        assert_eq!(file.path(), "src/api.py");
        assert_eq!(file.added_lines(), 10);
        assert_eq!(file.removed_lines(), 2);
        assert_eq!(outcome.analysis.change_type, CommitType::Feat);
        assert!(!outcome.analysis.breaking_change);

        assert!(outcome.changelog.starts_with("## feat(api): add pagination to list endpoint\n"));
        assert!(
            outcome
                .changelog
                .contains("- **src/api.py**: Add pagination to the list endpoint")
        );
        assert!(outcome.changelog.contains("_Generated on 2026-10-18_"));

        assert_eq!(
            kinds(&outcome.state),
            vec![
                EntryKind::StagedDiff,
                EntryKind::Analysis,
                EntryKind::Draft,
                EntryKind::Verdict,
                EntryKind::Changelog,
            ]
        );
    }

    #[tokio::test]
    async fn test_repairs_stop_after_budget() {
        let generator = scripted(
            r#"{"type": "fix", "description": "update stuff"}"#,
            r#"{"is_valid": false, "reasons": ["Description is too vague"]}"#,
            "fix: update more stuff",
        );
        let coordinator = Coordinator::new(source(API_DIFF), generator, PipelineConfig::default())
            .with_date(date());

        let outcome = coordinator.run().await.unwrap();

        assert_eq!(outcome.attempts, 5);
        assert_eq!(outcome.state.count(EntryKind::Repair), 5);
        assert_eq!(outcome.state.count(EntryKind::Verdict), 6);
        assert!(outcome.exhausted());
        assert_eq!(outcome.warnings(), ["Description is too vague".to_string()]);
        assert_eq!(outcome.final_message, "fix: update more stuff");
        assert!(outcome.state.latest(EntryKind::Changelog).is_some());
    }

    #[tokio::test]
    async fn test_custom_repair_budget() {
        let generator = scripted(
            r#"{"type": "fix", "description": "update stuff"}"#,
            r#"{"is_valid": false, "reasons": ["vague"]}"#,
            "fix: update things",
        );
        let config = PipelineConfig {
            max_repair_attempts: 2,
            ..PipelineConfig::default()
        };
        let outcome = Coordinator::new(source(API_DIFF), generator, config)
            .with_date(date())
            .run()
            .await
            .unwrap();

        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.state.count(EntryKind::Repair), 2);
    }

    #[tokio::test]
    async fn test_capitalized_past_tense_draft_is_repaired() {
        let generator = scripted("feat: Added pagination", VALID, "feat: add pagination");
        let config = PipelineConfig {
            semantic_validation: false,
            ..PipelineConfig::default()
        };
        let outcome = Coordinator::new(source(API_DIFF), generator, config)
            .with_date(date())
            .run()
            .await
            .unwrap();

        assert_eq!(outcome.final_message, "feat: add pagination");
        assert_eq!(outcome.attempts, 1);
        assert!(outcome.verdict.is_acceptable());
        assert_eq!(
            kinds(&outcome.state),
            vec![
                EntryKind::StagedDiff,
                EntryKind::Analysis,
                EntryKind::Draft,
                EntryKind::Verdict,
                EntryKind::Repair,
                EntryKind::Verdict,
                EntryKind::Changelog,
            ]
        );
        let first_verdict = &outcome.state.transcript()[3];
        assert!(first_verdict.content.contains("Added"));
    }

    #[tokio::test]
    async fn test_empty_diff_stops_at_fetch() {
        let mut generator = MockGenerator::new();
        generator.expect_generate().never();

        let err = Coordinator::new(source("  \n"), generator, PipelineConfig::default())
            .run()
            .await
            .unwrap_err();

        assert_eq!(err.stage, Stage::FetchDiff);
        assert!(matches!(err.kind, PipelineErrorKind::Git(GitError::NoStagedChanges)));
        assert_eq!(kinds(&err.state), vec![EntryKind::Error]);
        assert!(err.state.transcript()[0].is_error);
        assert!(err.state.analysis.is_none());
    }

    #[tokio::test]
    async fn test_generation_failure_carries_state() {
        let mut generator = MockGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_| Err(GenerationError::ServiceUnavailable("connection refused".to_string())));

        let err = Coordinator::new(source(API_DIFF), generator, PipelineConfig::default())
            .run()
            .await
            .unwrap_err();

        assert_eq!(err.stage, Stage::Analyze);
        assert_eq!(kinds(&err.state), vec![EntryKind::StagedDiff, EntryKind::Error]);
        assert!(err.state.transcript()[1].content.starts_with("Analyze: "));
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let mut source = MockDiffSource::new();
        source.expect_staged_diff().never();
        let mut generator = MockGenerator::new();
        generator.expect_generate().never();

        let coordinator = Coordinator::new(source, generator, PipelineConfig::default());
        coordinator.cancellation_token().cancel();

        let err = coordinator.run().await.unwrap_err();
        assert_eq!(err.stage, Stage::FetchDiff);
        assert!(matches!(err.kind, PipelineErrorKind::Cancelled));
    }

    #[tokio::test]
    async fn test_cancellation_checked_between_steps() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        let mut generator = MockGenerator::new();
        generator.expect_generate().returning(move |req| {
            Ok(match req.kind {
                PromptKind::FilePurpose => PURPOSE.to_string(),
                _ => {
                    // Lets the in-flight draft finish, then stops before Validate.
                    trigger.cancel();
                    r#"{"type": "feat", "description": "add pagination"}"#.to_string()
                }
            })
        });

        let err = Coordinator::new(source(API_DIFF), generator, PipelineConfig::default())
            .with_cancellation(token)
            .run()
            .await
            .unwrap_err();

        assert_eq!(err.stage, Stage::Validate);
        assert!(matches!(err.kind, PipelineErrorKind::Cancelled));
        assert_eq!(err.state.final_message.as_deref(), Some("feat: add pagination"));
    }
}
