//! Embedding API clients for remote providers

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::Embedder;
use crate::errors::DocQaError;
use crate::errors::Result;

/// Supported remote embedding providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProvider {
    /// `OpenAI` embeddings API
    OpenAI,
    /// Ollama local embeddings
    Ollama,
}

/// Client for generating embeddings over HTTP
pub struct EmbeddingClient {
    provider: EmbeddingProvider,
    model: String,
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

impl EmbeddingClient {
    /// Create a new embedding client
    ///
    /// # Errors
    /// - HTTP client build errors (invalid TLS configuration)
    pub fn new(
        provider: EmbeddingProvider,
        model: String,
        endpoint: String,
        api_key: Option<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| DocQaError::ConfigError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            provider,
            model,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    /// Generate embeddings in batch using `OpenAI` API
    async fn generate_batch_openai(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            DocQaError::EmbeddingError("OpenAI API key not provided".to_string())
        })?;

        #[derive(Serialize)]
        struct OpenAIBatchRequest<'a> {
            input: &'a [String],
            model: &'a str,
        }

        #[derive(Deserialize)]
        struct OpenAIResponse {
            data: Vec<EmbeddingData>,
        }

        #[derive(Deserialize)]
        struct EmbeddingData {
            index: usize,
            embedding: Vec<f32>,
        }

        let url = format!("{}/embeddings", self.endpoint);
        debug!("Calling OpenAI batch embeddings API: {} items", texts.len());

        let request = OpenAIBatchRequest {
            input: texts,
            model: &self.model,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&request)
            .send()
            .await
            .map_err(|e| DocQaError::EmbeddingError(format!("OpenAI request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DocQaError::EmbeddingError(format!(
                "OpenAI API error ({status}): {error_text}"
            )));
        }

        let mut result: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| DocQaError::EmbeddingError(format!("Failed to parse response: {e}")))?;

        // The API documents `index` as the position in the input list
        result.data.sort_by_key(|d| d.index);
        Ok(result.data.into_iter().map(|d| d.embedding).collect())
    }

    /// Generate embedding using Ollama API
    async fn generate_ollama(&self, text: &str) -> Result<Vec<f32>> {
        #[derive(Serialize)]
        struct OllamaRequest<'a> {
            model: &'a str,
            prompt: &'a str,
        }

        #[derive(Deserialize)]
        struct OllamaResponse {
            embedding: Vec<f32>,
        }

        let url = format!("{}/api/embeddings", self.endpoint);

        let request = OllamaRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DocQaError::EmbeddingError(format!("Ollama request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DocQaError::EmbeddingError(format!(
                "Ollama API error ({status}): {error_text}"
            )));
        }

        let result: OllamaResponse = response
            .json()
            .await
            .map_err(|e| DocQaError::EmbeddingError(format!("Failed to parse response: {e}")))?;

        Ok(result.embedding)
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        match self.provider {
            EmbeddingProvider::OpenAI => self.generate_batch_openai(texts).await,
            EmbeddingProvider::Ollama => {
                // Ollama has no batch endpoint; `buffered` keeps input order
                use futures::stream::StreamExt;
                use futures::stream::{
                    self,
                };

                let concurrency = texts.len().clamp(1, 16);
                let results: Vec<Result<Vec<f32>>> = stream::iter(texts.iter().cloned())
                    .map(|text| async move { self.generate_ollama(&text).await })
                    .buffered(concurrency)
                    .collect()
                    .await;

                results.into_iter().collect()
            }
        }
    }

    fn name(&self) -> &str {
        match self.provider {
            EmbeddingProvider::OpenAI => "openai",
            EmbeddingProvider::Ollama => "ollama",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let client = EmbeddingClient::new(
            EmbeddingProvider::Ollama,
            "all-minilm".to_string(),
            "http://localhost:11434/".to_string(),
            None,
        )
        .unwrap();
        assert_eq!(client.endpoint, "http://localhost:11434");
        assert_eq!(client.name(), "ollama");
    }

    #[tokio::test]
    async fn test_missing_openai_key_is_embedding_error() {
        let client = EmbeddingClient::new(
            EmbeddingProvider::OpenAI,
            "text-embedding-3-small".to_string(),
            "https://api.openai.com/v1".to_string(),
            None,
        )
        .unwrap();

        let err = client.encode(&["hello".to_string()]).await.unwrap_err();
        assert!(matches!(err, DocQaError::EmbeddingError(_)));
        assert!(err.is_embedding_failure());
    }

    #[tokio::test]
    async fn test_ollama_batch_runs_on_spawned_task() {
        let client = std::sync::Arc::new(
            EmbeddingClient::new(
                EmbeddingProvider::Ollama,
                "all-minilm".to_string(),
                "http://127.0.0.1:9".to_string(),
                None,
            )
            .unwrap(),
        );
        let texts = vec!["first".to_string(), "second".to_string()];

        let handle = tokio::spawn(async move { client.encode(&texts).await });
        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, DocQaError::EmbeddingError(_)));
    }

    #[tokio::test]
    #[ignore = "Requires a running Ollama server"]
    async fn test_ollama_embedding() {
        let client = EmbeddingClient::new(
            EmbeddingProvider::Ollama,
            "all-minilm".to_string(),
            "http://localhost:11434".to_string(),
            None,
        )
        .unwrap();

        let embeddings = client.encode(&["Hello, world!".to_string()]).await.unwrap();
        assert_eq!(embeddings.len(), 1);
        assert!(!embeddings[0].is_empty());
    }
}
