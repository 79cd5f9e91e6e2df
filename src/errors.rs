use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocQaError {
    #[error("Failed to extract text from '{source_name}': {message}")]
    Extraction {
        source_name: String,
        message: String,
    },

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("No content to search: the index is empty")]
    EmptyIndex,

    #[error("Generation error: {0}")]
    GenerationError(String),

    #[error("Generation timed out after {0}s")]
    GenerationTimeout(u64),

    #[error("Chunk {0} is not present in the chunk list")]
    ChunkNotFound(usize),

    #[error("Invalid index file: {0}")]
    IndexFormat(String),

    #[error("Invalid session state: {0}")]
    InvalidState(String),

    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),
}

impl DocQaError {
    /// Errors that abort only the current query; the session keeps its index.
    ///
    /// Includes embedding failures on the question. During indexing the same
    /// kinds abort the batch instead, see [`Self::is_embedding_failure`].
    #[must_use]
    pub const fn is_query_scoped(&self) -> bool {
        matches!(
            self,
            Self::EmptyIndex
                | Self::EmbeddingError(_)
                | Self::DimensionMismatch { .. }
                | Self::GenerationError(_)
                | Self::GenerationTimeout(_)
                | Self::ChunkNotFound(_)
        )
    }

    /// Errors raised by the embedding stage, during indexing or querying.
    #[must_use]
    pub const fn is_embedding_failure(&self) -> bool {
        matches!(
            self,
            Self::EmbeddingError(_) | Self::DimensionMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DocQaError>;
