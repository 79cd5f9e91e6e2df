//! Answer generation
//!
//! An [`AnswerGenerator`] turns a rendered prompt into answer text. Remote
//! generators ([`LlmService`]) talk to `OpenAI`-compatible or Ollama servers;
//! [`ExtractiveGenerator`] answers offline by quoting the best-matching
//! context sentence. Every generator decodes greedily so repeated questions
//! against an unchanged index give the same answer.

pub mod client;
pub mod extractive;

use std::sync::Arc;

use async_trait::async_trait;
pub use client::LlmService;
pub use extractive::ExtractiveGenerator;

use crate::config::LlmBackend;
use crate::config::LlmConfig;
use crate::errors::Result;

/// Everything a generator may use to produce one answer
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    /// Fully rendered prompt (template + context + question)
    pub prompt: &'a str,
    /// Generation length cap
    pub max_length: usize,
    /// Assembled context, for generators that work on it directly
    pub context: &'a str,
    /// Raw question text
    pub question: &'a str,
}

/// Maps a prompt to generated text
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Generate an answer
    ///
    /// # Errors
    /// - `GenerationError` when the backend fails or returns no text
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String>;

    /// Human-readable backend name for logs
    fn name(&self) -> &str;
}

/// Build the generator described by configuration
///
/// # Errors
/// - HTTP client build errors
pub fn generator_from_config(config: &LlmConfig) -> Result<Arc<dyn AnswerGenerator>> {
    let generator: Arc<dyn AnswerGenerator> = match config.provider {
        LlmBackend::Extractive => Arc::new(ExtractiveGenerator::new()),
        LlmBackend::OpenAI | LlmBackend::Ollama => Arc::new(LlmService::new(config)?),
    };
    tracing::info!("Using {} generator ({})", generator.name(), config.model);
    Ok(generator)
}
