//! The generation-service seam used by every pipeline step.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::config::{GenerationConfig, Provider};
use crate::error::GenerationError;
use crate::llm::claude::ClaudeGenerator;
use crate::llm::ollama::OllamaGenerator;

/// What a request is asking the service to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptKind {
    FilePurpose,
    DraftMessage,
    ValidateMessage,
    RepairMessage,
}

impl PromptKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptKind::FilePurpose => "file-purpose",
            PromptKind::DraftMessage => "draft-message",
            PromptKind::ValidateMessage => "validate-message",
            PromptKind::RepairMessage => "repair-message",
        }
    }
}

/// One request to the generation service.
///
/// When `schema` is set the reply is expected to be a JSON object matching
/// it; otherwise the reply is free text.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub kind: PromptKind,
    pub prompt: String,
    pub schema: Option<Value>,
}

impl GenerationRequest {
    pub fn text(kind: PromptKind, prompt: impl Into<String>) -> Self {
        Self {
            kind,
            prompt: prompt.into(),
            schema: None,
        }
    }

    pub fn structured(kind: PromptKind, prompt: impl Into<String>, schema: Value) -> Self {
        Self {
            kind,
            prompt: prompt.into(),
            schema: Some(schema),
        }
    }
}

/// A text-generation backend.
///
/// Implementations make exactly one attempt per call. Failures are reported
/// as [`GenerationError`] and never retried here.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Generator: Send + Sync {
    /// Send `request` and return the raw reply text.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

#[async_trait]
impl<G: Generator + ?Sized> Generator for Box<G> {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        (**self).generate(request).await
    }
}

#[async_trait]
impl<G: Generator + ?Sized> Generator for &G {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        (**self).generate(request).await
    }
}

/// Build the backend selected by `config.provider`.
pub fn build_generator(config: &GenerationConfig) -> Result<Box<dyn Generator>, GenerationError> {
    match config.provider {
        Provider::Ollama => Ok(Box::new(OllamaGenerator::new(config)?)),
        Provider::Claude => Ok(Box::new(ClaudeGenerator::new(config)?)),
    }
}
