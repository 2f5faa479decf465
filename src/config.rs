//! Run configuration.
//!
//! Everything here has a documented default so a bare `quill` invocation in
//! a repository with staged changes works against a local Ollama server.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default Ollama endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default per-request timeout for the generation service.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Repair attempts allowed before the last draft is accepted as-is.
pub const DEFAULT_MAX_REPAIR_ATTEMPTS: u32 = 5;

/// Which generation backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Local Ollama server over HTTP.
    #[default]
    Ollama,
    /// Claude Code CLI subprocess.
    Claude,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Ollama => "ollama",
            Provider::Claude => "claude",
        }
    }

    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Ollama => "llama3.2",
            Provider::Claude => "sonnet",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Provider::Ollama),
            "claude" => Ok(Provider::Claude),
            _ => Err(format!("Unknown provider '{}' (expected ollama or claude)", s)),
        }
    }
}

/// Settings for the text-generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub provider: Provider,
    pub model: String,
    /// Base URL of the HTTP service. Ignored by the Claude provider.
    pub endpoint: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Ollama,
            model: Provider::Ollama.default_model().to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            temperature: 0.0,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Settings for one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub repo_path: PathBuf,
    pub max_repair_attempts: u32,
    /// Number of file-purpose requests in flight at once during analysis.
    pub analysis_concurrency: usize,
    /// Ask the generation service to judge drafts after the structural check.
    pub semantic_validation: bool,
    pub generation: GenerationConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            repo_path: PathBuf::from("."),
            max_repair_attempts: DEFAULT_MAX_REPAIR_ATTEMPTS,
            analysis_concurrency: 1,
            semantic_validation: true,
            generation: GenerationConfig::default(),
        }
    }
}
