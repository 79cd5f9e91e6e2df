use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::errors::DocQaError;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_FILE: &str = "docqa.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_directory")]
    pub directory: String,
    #[serde(default = "default_file_output")]
    pub file_output: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_directory() -> String {
    "logs".to_string()
}

const fn default_file_output() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: default_log_directory(),
            file_output: default_file_output(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Characters per chunk
    #[serde(default = "default_chunk_length")]
    pub chunk_length: usize,
}

pub(crate) const fn default_chunk_length() -> usize {
    512
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_length: default_chunk_length(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks handed to the generator
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Separator placed between retrieved chunks in the context
    #[serde(default = "default_separator")]
    pub separator: String,
}

pub(crate) const fn default_top_k() -> usize {
    5
}

fn default_separator() -> String {
    ". ".to_string()
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            separator: default_separator(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Generation length cap
    #[serde(default = "default_max_answer_length")]
    pub max_answer_length: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,
}

pub(crate) const fn default_max_answer_length() -> usize {
    100
}

const fn default_timeout_secs() -> u64 {
    120
}

fn default_prompt_template() -> String {
    crate::rag::prompts::DEFAULT_QA_TEMPLATE.to_string()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_answer_length: default_max_answer_length(),
            timeout_secs: default_timeout_secs(),
            prompt_template: default_prompt_template(),
        }
    }
}

/// Backend used to turn text into vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    OpenAI,
    Ollama,
    /// Offline character-frequency embedder
    Histogram,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(default = "default_embedding_backend")]
    pub provider: EmbeddingBackend,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Expected vector dimension; checked against every response when set
    #[serde(default)]
    pub dimension: Option<usize>,
}

const fn default_embedding_backend() -> EmbeddingBackend {
    EmbeddingBackend::Ollama
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_embedding_model() -> String {
    "all-minilm".to_string()
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_backend(),
            endpoint: default_endpoint(),
            model: default_embedding_model(),
            api_key: None,
            dimension: None,
        }
    }
}

/// Backend used to generate answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    OpenAI,
    Ollama,
    /// Offline extractive answerer
    Extractive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_backend")]
    pub provider: LlmBackend,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

const fn default_llm_backend() -> LlmBackend {
    LlmBackend::Ollama
}

fn default_llm_model() -> String {
    "flan-t5".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_backend(),
            endpoint: default_endpoint(),
            model: default_llm_model(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_index_path")]
    pub path: String,
}

fn default_index_path() -> String {
    "docqa.index".to_string()
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: default_index_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub index: IndexConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// - File read errors
    /// - TOML syntax or type errors
    /// - Validation failures (zero lengths, malformed endpoints)
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text and apply environment overrides
    ///
    /// # Errors
    /// - TOML syntax or type errors
    /// - Validation failures
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let mut config: Self = toml::from_str(content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default locations
    ///
    /// Tries `docqa.toml`, then `config.example.toml`, then built-in defaults.
    ///
    /// # Errors
    /// - Same as [`AppConfig::from_file`] when a file is found
    pub fn load() -> crate::Result<Self> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            Self::from_file(DEFAULT_CONFIG_FILE)
        } else if Path::new("config.example.toml").exists() {
            tracing::warn!(
                "Using config.example.toml. Create {} for production use.",
                DEFAULT_CONFIG_FILE
            );
            Self::from_file("config.example.toml")
        } else {
            let mut config = Self::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }

    /// Apply `DOCQA_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("DOCQA_LLM_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("DOCQA_EMBEDDINGS_API_KEY") {
            self.embeddings.api_key = Some(key);
        }
        if let Ok(level) = std::env::var("DOCQA_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Validate option ranges and endpoints
    ///
    /// # Errors
    /// Returns `ConfigError` describing the first invalid option.
    pub fn validate(&self) -> crate::Result<()> {
        if self.chunking.chunk_length == 0 {
            return Err(DocQaError::ConfigError(
                "chunking.chunk_length must be greater than 0".to_string(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(DocQaError::ConfigError(
                "retrieval.top_k must be greater than 0".to_string(),
            ));
        }
        if self.generation.max_answer_length == 0 {
            return Err(DocQaError::ConfigError(
                "generation.max_answer_length must be greater than 0".to_string(),
            ));
        }
        if self.generation.timeout_secs == 0 {
            return Err(DocQaError::ConfigError(
                "generation.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.embeddings.provider != EmbeddingBackend::Histogram {
            validate_endpoint("embeddings.endpoint", &self.embeddings.endpoint)?;
        }
        if self.llm.provider != LlmBackend::Extractive {
            validate_endpoint("llm.endpoint", &self.llm.endpoint)?;
        }
        Ok(())
    }

    /// Get chunk length in characters
    pub fn chunk_length(&self) -> usize {
        self.chunking.chunk_length
    }

    /// Get number of chunks retrieved per query
    pub fn top_k(&self) -> usize {
        self.retrieval.top_k
    }

    /// Get generation length cap
    pub fn max_answer_length(&self) -> usize {
        self.generation.max_answer_length
    }

    /// Get generation timeout in seconds
    pub fn generation_timeout_secs(&self) -> u64 {
        self.generation.timeout_secs
    }

    /// Get path of the persisted index
    pub fn index_path(&self) -> &str {
        &self.index.path
    }
}

fn validate_endpoint(field: &str, endpoint: &str) -> crate::Result<()> {
    url::Url::parse(endpoint)
        .map(|_| ())
        .map_err(|e| DocQaError::ConfigError(format!("{field} '{endpoint}' is not a valid URL: {e}")))
}
