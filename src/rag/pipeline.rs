//! Question-answering session: index a document batch, then answer queries
//!
//! A [`RagSession`] owns the corpus, chunk list and vector index built from
//! the latest batch, together with the embedding and generation services it
//! was given at construction. All operations take `&mut self`, so a batch is
//! indexed to completion before any query runs and queries run one at a time.

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;
use tracing::warn;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::embeddings::EmbeddingService;
use crate::errors::DocQaError;
use crate::errors::Result;
use crate::llm::generator_from_config;
use crate::llm::AnswerGenerator;
use crate::llm::GenerationRequest;
use crate::models::Answer;
use crate::models::AnswerSource;
use crate::models::Chunk;
use crate::models::Corpus;
use crate::models::DocumentFailure;
use crate::models::ExtractedDocument;
use crate::models::RetrievalResult;
use crate::models::ScoreReport;
use crate::rag::Chunker;
use crate::rag::ContextAssembler;
use crate::rag::Evaluator;
use crate::rag::PromptTemplate;
use crate::rag::VectorIndex;

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Nothing indexed yet
    Idle,
    /// A document batch is being chunked and embedded
    Indexing,
    /// An index is available for queries
    Ready,
    /// A query is running
    Querying,
    /// The last query produced an answer
    AnswerReady,
}

impl SessionState {
    /// Whether an index exists and queries are accepted
    #[must_use]
    pub const fn accepts_queries(self) -> bool {
        matches!(self, Self::Ready | Self::AnswerReady)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Indexing => "indexing",
            Self::Ready => "ready",
            Self::Querying => "querying",
            Self::AnswerReady => "answer-ready",
        };
        f.write_str(name)
    }
}

/// Summary of one indexing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexReport {
    /// Documents that contributed to the corpus
    pub documents: usize,
    /// Documents excluded because extraction failed
    pub failures: Vec<DocumentFailure>,
    pub chunks: usize,
    pub dimension: Option<usize>,
    #[serde(with = "crate::models::duration_secs")]
    pub elapsed: Duration,
}

/// Chunk sidecar written next to a saved index
#[derive(Debug, Serialize, Deserialize)]
struct PersistedChunks {
    corpus: Corpus,
    chunks: Vec<Chunk>,
}

/// Everything produced by one successful indexing run
struct BuiltIndex {
    corpus: Corpus,
    chunks: Vec<Chunk>,
    index: VectorIndex,
    failures: Vec<DocumentFailure>,
    documents: usize,
}

/// Path of the chunk sidecar for an index file
#[must_use]
pub fn chunks_sidecar_path(index_path: &Path) -> PathBuf {
    let mut name = index_path.as_os_str().to_os_string();
    name.push(".chunks.json");
    PathBuf::from(name)
}

/// Stateful question-answering session
pub struct RagSession {
    id: Uuid,
    state: SessionState,
    chunker: Chunker,
    top_k: usize,
    max_answer_length: usize,
    generation_timeout: Duration,
    embeddings: EmbeddingService,
    generator: Arc<dyn AnswerGenerator>,
    context_assembler: ContextAssembler,
    prompt: PromptTemplate,
    evaluator: Evaluator,
    corpus: Corpus,
    chunks: Vec<Chunk>,
    index: VectorIndex,
    failures: Vec<DocumentFailure>,
    last_answer: Option<Answer>,
}

impl RagSession {
    /// Create a session around existing services
    ///
    /// # Errors
    /// - `ConfigError` if the configured prompt template is missing a placeholder
    pub fn new(
        config: &AppConfig,
        embeddings: EmbeddingService,
        generator: Arc<dyn AnswerGenerator>,
    ) -> Result<Self> {
        let prompt = PromptTemplate::question_answering(&config.generation.prompt_template)?;
        let id = Uuid::new_v4();
        info!(
            "Created session {} (embeddings: {}, generator: {})",
            id,
            embeddings.backend_name(),
            generator.name()
        );

        Ok(Self {
            id,
            state: SessionState::Idle,
            chunker: Chunker::new(config.chunk_length()),
            top_k: config.top_k(),
            max_answer_length: config.max_answer_length(),
            generation_timeout: Duration::from_secs(config.generation_timeout_secs()),
            embeddings,
            generator,
            context_assembler: ContextAssembler::new(config.retrieval.separator.clone()),
            prompt,
            evaluator: Evaluator::default(),
            corpus: Corpus::default(),
            chunks: Vec::new(),
            index: VectorIndex::new(),
            failures: Vec::new(),
            last_answer: None,
        })
    }

    /// Create a session with the services described by configuration
    ///
    /// # Errors
    /// - Embedding or generation client configuration errors
    /// - Prompt template errors
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let embeddings = EmbeddingService::from_config(&config.embeddings)?;
        let generator = generator_from_config(&config.llm)?;
        Self::new(config, embeddings, generator)
    }

    /// Override the number of retrieved chunks (minimum one)
    pub fn set_top_k(&mut self, top_k: usize) {
        self.top_k = top_k.max(1);
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub const fn top_k(&self) -> usize {
        self.top_k
    }

    #[must_use]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    #[must_use]
    pub const fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    #[must_use]
    pub const fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Extraction failures recorded by the latest successful indexing run
    #[must_use]
    pub fn failures(&self) -> &[DocumentFailure] {
        &self.failures
    }

    #[must_use]
    pub const fn last_answer(&self) -> Option<&Answer> {
        self.last_answer.as_ref()
    }

    /// Rebuild the index from a new document batch
    ///
    /// Failed extractions are recorded and skipped. The previous index, chunk
    /// list and state are kept if embedding or indexing fails.
    ///
    /// # Errors
    /// - `EmbeddingError` / `DimensionMismatch` from the embedder
    pub async fn index_documents(&mut self, batch: Vec<ExtractedDocument>) -> Result<IndexReport> {
        let previous = self.state;
        self.state = SessionState::Indexing;
        let start = Instant::now();

        let built = match self.build_index(batch).await {
            Ok(built) => built,
            Err(e) => {
                warn!("Session {}: indexing failed: {}", self.id, e);
                self.state = previous;
                return Err(e);
            }
        };

        let report = IndexReport {
            documents: built.documents,
            failures: built.failures.clone(),
            chunks: built.chunks.len(),
            dimension: built.index.dimension(),
            elapsed: Evaluator::measure_latency(start, Instant::now()),
        };

        self.corpus = built.corpus;
        self.chunks = built.chunks;
        self.index = built.index;
        self.failures = built.failures;
        self.last_answer = None;
        self.state = SessionState::Ready;

        info!(
            "Session {}: indexed {} chunks from {} documents ({} failed)",
            self.id,
            report.chunks,
            report.documents,
            report.failures.len()
        );
        Ok(report)
    }

    async fn build_index(&self, batch: Vec<ExtractedDocument>) -> Result<BuiltIndex> {
        let mut documents = Vec::with_capacity(batch.len());
        let mut failures = Vec::new();
        for extracted in batch {
            match extracted {
                Ok(document) => documents.push(document),
                Err(failure) => {
                    warn!("Skipping {}: {}", failure.source, failure.message);
                    failures.push(failure);
                }
            }
        }

        let corpus = Corpus::from_documents(&documents);
        let chunks = self.chunker.chunk(&corpus.text);
        debug!(
            "Corpus of {} characters split into {} chunks",
            corpus.char_len(),
            chunks.len()
        );

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let vectors = self.embeddings.encode(&texts).await?;

        let mut index = VectorIndex::new();
        index.add(&vectors)?;

        Ok(BuiltIndex {
            corpus,
            chunks,
            index,
            failures,
            documents: documents.len(),
        })
    }

    /// Answer a question from the indexed documents
    ///
    /// A supplied, non-blank `reference` is scored against the answer. On
    /// failure the session returns to `Ready` with its index untouched.
    ///
    /// # Errors
    /// - `InvalidState` if nothing has been indexed
    /// - `EmptyIndex` if the indexed batch produced no chunks
    /// - `EmbeddingError` / `DimensionMismatch` embedding the question
    /// - `GenerationError` / `GenerationTimeout` from the generator
    pub async fn ask(&mut self, question: &str, reference: Option<&str>) -> Result<Answer> {
        self.ensure_indexed()?;
        self.state = SessionState::Querying;

        match self.answer(question, reference).await {
            Ok(answer) => {
                self.last_answer = Some(answer.clone());
                self.state = SessionState::AnswerReady;
                Ok(answer)
            }
            Err(e) => {
                warn!("Session {}: query failed: {}", self.id, e);
                self.state = SessionState::Ready;
                Err(e)
            }
        }
    }

    async fn answer(&self, question: &str, reference: Option<&str>) -> Result<Answer> {
        info!("Session {}: processing query: {}", self.id, question);
        let query_start = Instant::now();

        debug!("Step 1: Retrieving chunks");
        let result = self.retrieve(question, self.top_k).await?;
        debug!("Retrieved {} chunks", result.len());

        debug!("Step 2: Assembling context");
        let context = self.context_assembler.assemble(&result, &self.chunks)?;
        let prompt = self.prompt.render_qa(&context, question);

        debug!("Step 3: Generating answer");
        let request = GenerationRequest {
            prompt: &prompt,
            max_length: self.max_answer_length,
            context: &context,
            question,
        };
        let start = Instant::now();
        let text = tokio::time::timeout(self.generation_timeout, self.generator.generate(&request))
            .await
            .map_err(|_| DocQaError::GenerationTimeout(self.generation_timeout.as_secs()))??;
        let elapsed = Evaluator::measure_latency(start, Instant::now());

        debug!("Step 4: Evaluating answer");
        let scores = self.evaluator.score_optional(&text, reference);
        let sources = self.context_assembler.sources(&result, &self.chunks, &self.corpus);
        let total_elapsed = Evaluator::measure_latency(query_start, Instant::now());

        info!(
            "Session {}: answered in {:.2}s (generation {:.2}s)",
            self.id,
            total_elapsed.as_secs_f64(),
            elapsed.as_secs_f64()
        );
        Ok(Answer {
            question: question.to_string(),
            text,
            elapsed,
            total_elapsed,
            sources,
            scores,
            rating: None,
            created_at: Utc::now(),
        })
    }

    /// Retrieve the `k` chunks nearest to `query` without generating
    ///
    /// # Errors
    /// - `InvalidState` if nothing has been indexed
    /// - `EmptyIndex` if the index holds no chunks
    /// - Embedding errors
    pub async fn search(&self, query: &str, k: usize) -> Result<RetrievalResult> {
        self.ensure_indexed()?;
        self.retrieve(query, k).await
    }

    async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievalResult> {
        if self.index.is_empty() {
            return Err(DocQaError::EmptyIndex);
        }
        let query_vector = self.embeddings.encode_one(query).await?;
        self.index.search(&query_vector, k)
    }

    /// Describe retrieved chunks for display
    #[must_use]
    pub fn describe(&self, result: &RetrievalResult) -> Vec<AnswerSource> {
        self.context_assembler
            .sources(result, &self.chunks, &self.corpus)
    }

    /// Score the last answer against a reference
    ///
    /// # Errors
    /// - `InvalidState` if no answer has been produced yet
    pub fn evaluate_last(&mut self, reference: &str) -> Result<ScoreReport> {
        let evaluator = self.evaluator;
        let answer = self.last_answer_mut()?;
        let report = evaluator.score(&answer.text, reference);
        answer.scores = Some(report);
        Ok(report)
    }

    /// Record a user rating for the last answer
    ///
    /// # Errors
    /// - `InvalidRating` unless `rating` is in 1..=5
    /// - `InvalidState` if no answer has been produced yet
    pub fn rate_last(&mut self, rating: u8) -> Result<()> {
        if !(1..=5).contains(&rating) {
            return Err(DocQaError::InvalidRating(rating));
        }
        let answer = self.last_answer_mut()?;
        answer.rating = Some(rating);
        info!("Recorded rating {} for last answer", rating);
        Ok(())
    }

    /// Write the index and its chunk sidecar
    ///
    /// # Errors
    /// - `InvalidState` if nothing has been indexed
    /// - File write or serialization errors
    pub fn save_index<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.ensure_indexed()?;
        let path = path.as_ref();

        self.index.save(path)?;
        let sidecar = PersistedChunks {
            corpus: self.corpus.clone(),
            chunks: self.chunks.clone(),
        };
        std::fs::write(chunks_sidecar_path(path), serde_json::to_vec(&sidecar)?)?;
        Ok(())
    }

    /// Replace the session's index with one previously saved
    ///
    /// # Errors
    /// - File read errors
    /// - `IndexFormat` if the index is corrupt or disagrees with its sidecar
    /// - `DimensionMismatch` if the embedder is pinned to a different dimension
    pub fn load_index<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let index = VectorIndex::load(path)?;
        let sidecar: PersistedChunks =
            serde_json::from_slice(&std::fs::read(chunks_sidecar_path(path))?)?;

        if index.len() != sidecar.chunks.len() {
            return Err(DocQaError::IndexFormat(format!(
                "index holds {} vectors but sidecar lists {} chunks",
                index.len(),
                sidecar.chunks.len()
            )));
        }
        if let (Some(expected), Some(actual)) =
            (self.embeddings.expected_dimension(), index.dimension())
        {
            if expected != actual {
                return Err(DocQaError::DimensionMismatch { expected, actual });
            }
        }

        self.corpus = sidecar.corpus;
        self.chunks = sidecar.chunks;
        self.index = index;
        self.failures.clear();
        self.last_answer = None;
        self.state = SessionState::Ready;
        info!("Session {}: loaded {} chunks", self.id, self.chunks.len());
        Ok(())
    }

    fn ensure_indexed(&self) -> Result<()> {
        if self.state.accepts_queries() {
            Ok(())
        } else {
            Err(DocQaError::InvalidState(format!(
                "session is {}; index documents first",
                self.state
            )))
        }
    }

    fn last_answer_mut(&mut self) -> Result<&mut Answer> {
        self.last_answer
            .as_mut()
            .ok_or_else(|| DocQaError::InvalidState("no answer to evaluate yet".to_string()))
    }
}
