//! Ollama chat client.
//!
//! Talks to `POST {endpoint}/api/chat` with streaming disabled. Structured
//! requests pass their JSON schema as the `format` field so the server
//! constrains the reply.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::GenerationConfig;
use crate::error::GenerationError;
use crate::llm::generator::{GenerationRequest, Generator};

/// Chat request body.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a Value>,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

/// Non-streaming chat response. Only the message content is used.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

/// Generator backed by a local Ollama server.
pub struct OllamaGenerator {
    client: Client,
    url: String,
    model: String,
    temperature: f32,
    timeout_secs: u64,
}

impl OllamaGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                GenerationError::ServiceUnavailable(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            url: format!("{}/api/chat", config.endpoint.trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout_secs: config.timeout.as_secs(),
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout(self.timeout_secs)
        } else {
            GenerationError::ServiceUnavailable(format!("{} ({})", err, self.url))
        }
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            stream: false,
            format: request.schema.as_ref(),
            options: ChatOptions {
                temperature: self.temperature,
            },
        };

        debug!(
            kind = request.kind.as_str(),
            model = %self.model,
            prompt_chars = request.prompt.len(),
            "Sending chat request"
        );

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::ServiceUnavailable(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            GenerationError::MalformedResponse(format!("unexpected chat response body: {e}"))
        })?;

        let content = parsed.message.map(|m| m.content).unwrap_or_default();
        if content.trim().is_empty() {
            return Err(GenerationError::MalformedResponse(
                "chat response had no message content".to_string(),
            ));
        }

        Ok(content)
    }
}
