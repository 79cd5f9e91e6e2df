//! Embedding service with batching and output validation

use std::sync::Arc;

use tracing::debug;
use tracing::info;

use super::client::EmbeddingProvider;
use super::Embedder;
use super::EmbeddingClient;
use super::HistogramEmbedder;
use super::MAX_BATCH_SIZE;
use crate::config::EmbeddingBackend;
use crate::config::EmbeddingsConfig;
use crate::errors::DocQaError;
use crate::errors::Result;

/// Validating front end over an [`Embedder`]
///
/// Constructed once per process and shared by every batch and query.
#[derive(Clone)]
pub struct EmbeddingService {
    embedder: Arc<dyn Embedder>,
    expected_dimension: Option<usize>,
    batch_size: usize,
}

impl EmbeddingService {
    /// Wrap an existing embedder
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            expected_dimension: None,
            batch_size: MAX_BATCH_SIZE,
        }
    }

    /// Build the embedder described by configuration
    ///
    /// # Errors
    /// - HTTP client build errors
    pub fn from_config(config: &EmbeddingsConfig) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = match config.provider {
            EmbeddingBackend::Histogram => Arc::new(HistogramEmbedder::new()),
            EmbeddingBackend::OpenAI => Arc::new(EmbeddingClient::new(
                EmbeddingProvider::OpenAI,
                config.model.clone(),
                config.endpoint.clone(),
                config.api_key.clone(),
            )?),
            EmbeddingBackend::Ollama => Arc::new(EmbeddingClient::new(
                EmbeddingProvider::Ollama,
                config.model.clone(),
                config.endpoint.clone(),
                config.api_key.clone(),
            )?),
        };
        info!("Using {} embeddings ({})", embedder.name(), config.model);

        Ok(Self {
            embedder,
            expected_dimension: config.dimension,
            batch_size: MAX_BATCH_SIZE,
        })
    }

    /// Require every vector to have this dimension
    #[must_use]
    pub fn with_expected_dimension(mut self, dimension: usize) -> Self {
        self.expected_dimension = Some(dimension);
        self
    }

    /// Override the per-call batch size (minimum one)
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Encode texts in batches, one vector per text, preserving order
    ///
    /// # Errors
    /// - `EmbeddingError` if the backend fails or returns the wrong number of vectors
    /// - `DimensionMismatch` if vectors disagree on dimension
    pub async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let vectors = self.embedder.encode(batch).await?;
            if vectors.len() != batch.len() {
                return Err(DocQaError::EmbeddingError(format!(
                    "{} returned {} vectors for {} texts",
                    self.embedder.name(),
                    vectors.len(),
                    batch.len()
                )));
            }
            embeddings.extend(vectors);
        }

        let expected = self
            .expected_dimension
            .unwrap_or_else(|| embeddings[0].len());
        if expected == 0 {
            return Err(DocQaError::EmbeddingError(format!(
                "{} returned empty vectors",
                self.embedder.name()
            )));
        }
        if let Some(bad) = embeddings.iter().find(|v| v.len() != expected) {
            return Err(DocQaError::DimensionMismatch {
                expected,
                actual: bad.len(),
            });
        }

        debug!(
            "Encoded {} texts into {}-dimensional vectors",
            embeddings.len(),
            expected
        );
        Ok(embeddings)
    }

    /// Encode a single text
    ///
    /// # Errors
    /// - Same as [`EmbeddingService::encode`]
    pub async fn encode_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.encode(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| DocQaError::EmbeddingError("No embedding returned".to_string()))
    }

    /// Dimension every vector must have, if pinned by configuration
    #[must_use]
    pub const fn expected_dimension(&self) -> Option<usize> {
        self.expected_dimension
    }

    /// Name of the underlying backend
    #[must_use]
    pub fn backend_name(&self) -> &str {
        self.embedder.name()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct FixedEmbedder {
        dims: Vec<usize>,
    }

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .zip(self.dims.iter().cycle())
                .map(|(_, &dim)| vec![0.5; dim])
                .collect())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        async fn encode(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0, 2.0]])
        }

        fn name(&self) -> &str {
            "short"
        }
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("text {i}")).collect()
    }

    #[tokio::test]
    async fn test_batches_preserve_count() {
        let service = EmbeddingService::new(Arc::new(FixedEmbedder { dims: vec![4] }))
            .with_batch_size(3);
        let vectors = service.encode(&texts(10)).await.unwrap();

        assert_eq!(vectors.len(), 10);
        assert!(vectors.iter().all(|v| v.len() == 4));
    }

    #[tokio::test]
    async fn test_mixed_dimensions_rejected() {
        let service = EmbeddingService::new(Arc::new(FixedEmbedder { dims: vec![4, 5] }));
        let err = service.encode(&texts(2)).await.unwrap_err();

        assert!(matches!(
            err,
            DocQaError::DimensionMismatch {
                expected: 4,
                actual: 5
            }
        ));
    }

    #[tokio::test]
    async fn test_expected_dimension_enforced() {
        let service = EmbeddingService::new(Arc::new(FixedEmbedder { dims: vec![4] }))
            .with_expected_dimension(384);
        let err = service.encode_one("hello").await.unwrap_err();

        assert!(matches!(err, DocQaError::DimensionMismatch { expected: 384, .. }));
    }

    #[tokio::test]
    async fn test_wrong_vector_count_is_embedding_error() {
        let service = EmbeddingService::new(Arc::new(ShortEmbedder));
        let err = service.encode(&texts(3)).await.unwrap_err();

        assert!(matches!(err, DocQaError::EmbeddingError(_)));
    }

    #[tokio::test]
    async fn test_empty_input() {
        let service = EmbeddingService::new(Arc::new(ShortEmbedder));
        assert!(service.encode(&[]).await.unwrap().is_empty());
    }

    #[test]
    fn test_from_config_histogram() {
        let config = EmbeddingsConfig {
            provider: EmbeddingBackend::Histogram,
            ..EmbeddingsConfig::default()
        };
        let service = EmbeddingService::from_config(&config).unwrap();
        assert_eq!(service.backend_name(), "histogram");
    }
}
