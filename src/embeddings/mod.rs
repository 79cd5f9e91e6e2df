//! Embeddings generation module
//!
//! Text is mapped to fixed-dimension vectors by an [`Embedder`]:
//! - `OpenAI` embeddings API (batched)
//! - Ollama local models
//! - [`HistogramEmbedder`], an offline character-frequency embedder
//!
//! [`EmbeddingService`] wraps any embedder with batching and output
//! validation and is what the pipeline talks to.
//!
//! # Examples
//!
//! ```rust,no_run
//! use docqa::config::AppConfig;
//! use docqa::embeddings::EmbeddingService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = EmbeddingService::from_config(&config.embeddings)?;
//!
//!     let embedding = service.encode_one("Hello, world!").await?;
//!     println!("Generated embedding with {} dimensions", embedding.len());
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod histogram;
pub mod service;

use async_trait::async_trait;
pub use client::EmbeddingClient;
pub use histogram::HistogramEmbedder;
pub use service::EmbeddingService;

use crate::errors::Result;

/// Maximum number of texts sent to an embedder in one call
pub const MAX_BATCH_SIZE: usize = 100;

/// Maps texts to vectors, one per input, preserving order
///
/// Implementations must be deterministic for a fixed configuration.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Encode a batch of texts
    ///
    /// # Errors
    /// - `EmbeddingError` when the backend fails or returns malformed output
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Human-readable backend name for logs
    fn name(&self) -> &str;
}
