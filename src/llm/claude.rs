//! Claude Code CLI backend.
//!
//! Runs `claude -p <prompt> --output-format json` and unwraps the CLI's JSON
//! envelope. The CLI has no schema flag, so structured requests carry their
//! schema inside the prompt.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::config::GenerationConfig;
use crate::error::{ClaudeError, GenerationError};
use crate::llm::generator::{GenerationRequest, Generator};

/// Runs one prompt through the Claude CLI.
///
/// This abstraction allows mocking the subprocess in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClaudeExecutor: Send + Sync {
    /// Run Claude with the given prompt and return its raw stdout.
    async fn run(&self, prompt: &str) -> Result<String, ClaudeError>;
}

/// Executor that spawns the real `claude` binary.
pub struct CliExecutor {
    program: String,
    model: Option<String>,
    timeout: Duration,
}

#[async_trait]
impl ClaudeExecutor for CliExecutor {
    async fn run(&self, prompt: &str) -> Result<String, ClaudeError> {
        run_claude(&self.program, prompt, self.model.as_deref(), self.timeout).await
    }
}

/// Generator backed by the Claude Code CLI.
pub struct ClaudeGenerator<E = CliExecutor> {
    executor: E,
}

impl ClaudeGenerator {
    /// Fails with [`ClaudeError::NotInstalled`] when `claude` is not on `PATH`.
    pub fn new(config: &GenerationConfig) -> Result<Self, ClaudeError> {
        which::which("claude").map_err(|_| ClaudeError::NotInstalled)?;
        Ok(Self {
            executor: CliExecutor {
                program: "claude".to_string(),
                model: Some(config.model.clone()).filter(|m| !m.is_empty()),
                timeout: config.timeout,
            },
        })
    }
}

impl<E: ClaudeExecutor> ClaudeGenerator<E> {
    #[cfg(test)]
    pub(crate) fn with_executor(executor: E) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl<E: ClaudeExecutor> Generator for ClaudeGenerator<E> {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let prompt = render_prompt(request);
        debug!(kind = request.kind.as_str(), prompt_chars = prompt.len(), "Running Claude CLI");
        let stdout = self.executor.run(&prompt).await?;
        unwrap_envelope(&stdout)
    }
}

/// Append the reply schema to the prompt for structured requests.
fn render_prompt(request: &GenerationRequest) -> String {
    match &request.schema {
        Some(schema) => format!(
            "{}\n\nRespond with only a JSON object matching this JSON schema, with no other text:\n{}",
            request.prompt, schema
        ),
        None => request.prompt.clone(),
    }
}

/// Claude CLI JSON envelope when using --output-format json
#[derive(Deserialize)]
struct ClaudeCliResponse {
    result: String,
    #[serde(default)]
    is_error: bool,
}

fn unwrap_envelope(stdout: &str) -> Result<String, GenerationError> {
    let envelope: ClaudeCliResponse = serde_json::from_str(stdout.trim()).map_err(|e| {
        GenerationError::MalformedResponse(format!("Claude CLI output is not a JSON envelope: {e}"))
    })?;

    if envelope.is_error {
        return Err(ClaudeError::ExecutionFailed(envelope.result).into());
    }
    if envelope.result.trim().is_empty() {
        return Err(GenerationError::MalformedResponse(
            "Claude CLI returned an empty result".to_string(),
        ));
    }

    Ok(envelope.result)
}

/// Spawn `program` (normally `claude`) once, bounded by `limit`.
async fn run_claude(
    program: &str,
    prompt: &str,
    model: Option<&str>,
    limit: Duration,
) -> Result<String, ClaudeError> {
    let mut command = Command::new(program);
    command
        .arg("-p")
        .arg(prompt)
        .arg("--output-format")
        .arg("json")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(model) = model {
        command.arg("--model").arg(model);
    }

    let output = timeout(limit, command.output())
        .await
        .map_err(|_| ClaudeError::Timeout(limit.as_secs()))?
        .map_err(ClaudeError::SpawnFailed)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);
        return Err(ClaudeError::NonZeroExit { code, stderr });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
