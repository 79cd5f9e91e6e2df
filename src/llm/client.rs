//! HTTP generation client for `OpenAI`-compatible and Ollama servers

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::AnswerGenerator;
use super::GenerationRequest;
use crate::config::LlmBackend;
use crate::config::LlmConfig;
use crate::errors::DocQaError;
use crate::errors::Result;

/// Remote text generation service
pub struct LlmService {
    backend: LlmBackend,
    model: String,
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

impl LlmService {
    /// Create a new generation client
    ///
    /// The request deadline is enforced by the pipeline, not the HTTP client.
    ///
    /// # Errors
    /// - `ConfigError` for the extractive backend or an HTTP client build failure
    pub fn new(config: &LlmConfig) -> Result<Self> {
        if config.provider == LlmBackend::Extractive {
            return Err(DocQaError::ConfigError(
                "extractive generation does not use an HTTP client".to_string(),
            ));
        }

        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DocQaError::ConfigError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            backend: config.provider,
            model: config.model.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client,
        })
    }

    async fn generate_openai(&self, prompt: &str, max_length: usize) -> Result<String> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            DocQaError::GenerationError("OpenAI API key not provided".to_string())
        })?;

        #[derive(Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            temperature: f32,
            max_tokens: usize,
            messages: Vec<ChatMessage<'a>>,
        }

        #[derive(Serialize)]
        struct ChatMessage<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<ChatChoice>,
        }

        #[derive(Deserialize)]
        struct ChatChoice {
            message: AssistantMessage,
        }

        #[derive(Deserialize)]
        struct AssistantMessage {
            content: Option<String>,
        }

        let url = format!("{}/chat/completions", self.endpoint);
        debug!("Calling OpenAI chat completions: {}", url);

        let request = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            max_tokens: max_length,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&request)
            .send()
            .await
            .map_err(|e| DocQaError::GenerationError(format!("OpenAI request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DocQaError::GenerationError(format!(
                "OpenAI API error ({status}): {error_text}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| DocQaError::GenerationError(format!("Failed to parse response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .ok_or_else(|| DocQaError::GenerationError("No completion in response".to_string()))
    }

    async fn generate_ollama(&self, prompt: &str, max_length: usize) -> Result<String> {
        #[derive(Serialize)]
        struct GenerateRequest<'a> {
            model: &'a str,
            prompt: &'a str,
            stream: bool,
            options: GenerateOptions,
        }

        #[derive(Serialize)]
        struct GenerateOptions {
            temperature: f32,
            num_predict: usize,
            seed: u64,
        }

        #[derive(Deserialize)]
        struct GenerateResponse {
            response: String,
        }

        let url = format!("{}/api/generate", self.endpoint);
        debug!("Calling Ollama generate API: {}", url);

        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: 0.0,
                num_predict: max_length,
                seed: 0,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DocQaError::GenerationError(format!("Ollama request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DocQaError::GenerationError(format!(
                "Ollama API error ({status}): {error_text}"
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| DocQaError::GenerationError(format!("Failed to parse response: {e}")))?;

        Ok(parsed.response)
    }
}

#[async_trait]
impl AnswerGenerator for LlmService {
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String> {
        let text = match self.backend {
            LlmBackend::OpenAI => {
                self.generate_openai(request.prompt, request.max_length)
                    .await?
            }
            _ => {
                self.generate_ollama(request.prompt, request.max_length)
                    .await?
            }
        };
        Ok(text.trim().to_string())
    }

    fn name(&self) -> &str {
        match self.backend {
            LlmBackend::OpenAI => "openai",
            _ => "ollama",
        }
    }
}
