//! Text-generation service clients.
//!
//! The pipeline talks to a [`Generator`]; which backend sits behind it is
//! chosen from [`GenerationConfig`](crate::config::GenerationConfig).

pub mod claude;
pub mod generator;
pub mod json;
pub mod ollama;

pub use claude::ClaudeGenerator;
pub use generator::{GenerationRequest, Generator, PromptKind, build_generator};
pub use json::{extract_json, parse_reply};
pub use ollama::OllamaGenerator;
