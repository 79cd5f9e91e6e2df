use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use docqa::embeddings::Embedder;
use docqa::embeddings::EmbeddingService;
use docqa::embeddings::HistogramEmbedder;
use docqa::ingest::load_documents;
use docqa::llm::AnswerGenerator;
use docqa::llm::ExtractiveGenerator;
use docqa::llm::GenerationRequest;
use docqa::models::Document;
use docqa::models::DocumentFailure;
use docqa::models::ExtractedDocument;
use docqa::rag::chunker::chunk;
use docqa::rag::RagSession;
use docqa::rag::SessionState;
use docqa::AppConfig;
use docqa::DocQaError;
use docqa::Result;
use tempfile::TempDir;

const SCENARIO_TEXT: &str = "Hello world. This is a test.";

/// Histogram embedder that fails once `remaining` calls are used up
struct FlakyEmbedder {
    remaining: AtomicUsize,
}

#[async_trait]
impl Embedder for FlakyEmbedder {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let ok = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if !ok {
            return Err(DocQaError::EmbeddingError("model unavailable".to_string()));
        }
        Ok(texts.iter().map(|t| HistogramEmbedder::embed(t)).collect())
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

/// Fails every other call, starting with the first
struct AlternatingGenerator {
    calls: AtomicUsize,
}

#[async_trait]
impl AnswerGenerator for AlternatingGenerator {
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String> {
        if self.calls.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
            Err(DocQaError::GenerationError("decoder crashed".to_string()))
        } else {
            Ok(format!("{} chars of context", request.context.chars().count()))
        }
    }

    fn name(&self) -> &str {
        "alternating"
    }
}

/// Histogram embedder that sleeps before every call
struct DelayedEmbedder {
    delay: Duration,
}

#[async_trait]
impl Embedder for DelayedEmbedder {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        tokio::time::sleep(self.delay).await;
        Ok(texts.iter().map(|t| HistogramEmbedder::embed(t)).collect())
    }

    fn name(&self) -> &str {
        "delayed"
    }
}

struct SlowGenerator;

#[async_trait]
impl AnswerGenerator for SlowGenerator {
    async fn generate(&self, _request: &GenerationRequest<'_>) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok("too late".to_string())
    }

    fn name(&self) -> &str {
        "slow"
    }
}

fn config(chunk_length: usize) -> AppConfig {
    let mut config = AppConfig::default();
    config.chunking.chunk_length = chunk_length;
    config
}

fn session_with(
    chunk_length: usize,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn AnswerGenerator>,
) -> Result<RagSession> {
    docqa::logging::init_simple_logging();
    RagSession::new(&config(chunk_length), EmbeddingService::new(embedder), generator)
}

fn histogram_session(chunk_length: usize) -> Result<RagSession> {
    session_with(
        chunk_length,
        Arc::new(HistogramEmbedder::new()),
        Arc::new(ExtractiveGenerator::new()),
    )
}

fn documents(texts: &[&str]) -> Vec<ExtractedDocument> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| Ok(Document::new(format!("doc{i}.txt"), *text)))
        .collect()
}

#[tokio::test]
async fn test_scenario_query_hits_first_chunk() -> Result<()> {
    let mut session = histogram_session(10)?;
    let report = session.index_documents(documents(&[SCENARIO_TEXT])).await?;

    assert_eq!(report.chunks, 3);
    let texts: Vec<&str> = session.chunks().iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["Hello worl", "d. This is", " a test."]);

    let result = session.search("world", 1).await?;
    assert_eq!(result.ids().collect::<Vec<_>>(), vec![0]);
    Ok(())
}

#[tokio::test]
async fn test_search_ordering_and_clamping() -> Result<()> {
    let mut session = histogram_session(10)?;
    session.index_documents(documents(&[SCENARIO_TEXT])).await?;

    let two = session.search("test", 2).await?;
    assert_eq!(two.len(), 2);
    assert!(two.neighbors[0].distance <= two.neighbors[1].distance);

    let all = session.search("test", 50).await?;
    assert_eq!(all.len(), 3);
    assert!(all
        .neighbors
        .windows(2)
        .all(|pair| pair[0].distance <= pair[1].distance));
    assert!(all.ids().all(|id| id < 3));
    Ok(())
}

#[tokio::test]
async fn test_empty_corpus_reports_empty_index() -> Result<()> {
    let mut session = histogram_session(10)?;
    let report = session.index_documents(Vec::new()).await?;

    assert_eq!(report.chunks, 0);
    assert_eq!(session.state(), SessionState::Ready);
    assert!(session.index().is_empty());

    let err = session.ask("anything?", None).await.unwrap_err();
    assert!(matches!(err, DocQaError::EmptyIndex));
    assert_eq!(err.to_string(), "No content to search: the index is empty");
    assert_eq!(session.state(), SessionState::Ready);
    Ok(())
}

#[tokio::test]
async fn test_extraction_failures_are_isolated() -> Result<()> {
    let mut session = histogram_session(512)?;
    let batch = vec![
        Ok(Document::new("a.txt", "Ferris is the Rust mascot.")),
        Err(DocumentFailure {
            source: "broken.pdf".to_string(),
            message: "unsupported encoding".to_string(),
        }),
        Ok(Document::new("b.txt", "Cargo is the Rust package manager.")),
    ];

    let report = session.index_documents(batch).await?;

    assert_eq!(report.documents, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].source, "broken.pdf");
    assert_eq!(
        session.corpus().text,
        "Ferris is the Rust mascot. Cargo is the Rust package manager."
    );
    assert_eq!(session.failures().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_embedding_failure_keeps_previous_index() -> Result<()> {
    let embedder = Arc::new(FlakyEmbedder {
        remaining: AtomicUsize::new(1),
    });
    let mut session = session_with(10, embedder, Arc::new(ExtractiveGenerator::new()))?;

    session.index_documents(documents(&[SCENARIO_TEXT])).await?;
    let chunks_before = session.chunks().to_vec();
    let index_before = session.index().clone();

    let err = session
        .index_documents(documents(&["A completely different batch of text."]))
        .await
        .unwrap_err();

    assert!(err.is_embedding_failure());
    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(session.chunks(), chunks_before.as_slice());
    assert_eq!(session.index(), &index_before);
    Ok(())
}

#[tokio::test]
async fn test_question_embedding_failure_is_query_scoped() -> Result<()> {
    let embedder = Arc::new(FlakyEmbedder {
        remaining: AtomicUsize::new(1),
    });
    let mut session = session_with(10, embedder, Arc::new(ExtractiveGenerator::new()))?;
    session.index_documents(documents(&[SCENARIO_TEXT])).await?;

    let err = session.ask("world", None).await.unwrap_err();
    assert!(err.is_embedding_failure());
    assert!(err.is_query_scoped());
    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(session.chunks().len(), 3);
    assert_eq!(session.index().len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_answer_timing_includes_retrieval() -> Result<()> {
    let delay = Duration::from_millis(50);
    let mut session = session_with(
        10,
        Arc::new(DelayedEmbedder { delay }),
        Arc::new(ExtractiveGenerator::new()),
    )?;
    session.index_documents(documents(&[SCENARIO_TEXT])).await?;

    let answer = session.ask("world", None).await?;
    assert!(answer.total_elapsed >= delay);
    assert!(answer.total_elapsed >= answer.elapsed);
    Ok(())
}

#[tokio::test]
async fn test_generation_failure_leaves_session_usable() -> Result<()> {
    let generator = Arc::new(AlternatingGenerator {
        calls: AtomicUsize::new(0),
    });
    let mut session = session_with(10, Arc::new(HistogramEmbedder::new()), generator)?;
    session.index_documents(documents(&[SCENARIO_TEXT])).await?;

    let err = session.ask("world", None).await.unwrap_err();
    assert!(matches!(err, DocQaError::GenerationError(_)));
    assert!(err.is_query_scoped());
    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(session.chunks().len(), 3);

    let answer = session.ask("world", None).await?;
    assert_eq!(session.state(), SessionState::AnswerReady);
    assert!(answer.text.ends_with("chars of context"));
    Ok(())
}

#[tokio::test]
async fn test_generation_timeout() -> Result<()> {
    let mut config = config(10);
    config.generation.timeout_secs = 1;
    let mut session = RagSession::new(
        &config,
        EmbeddingService::new(Arc::new(HistogramEmbedder::new())),
        Arc::new(SlowGenerator),
    )?;
    session.index_documents(documents(&[SCENARIO_TEXT])).await?;

    let err = session.ask("world", None).await.unwrap_err();
    assert!(matches!(err, DocQaError::GenerationTimeout(1)));
    assert_eq!(session.state(), SessionState::Ready);
    Ok(())
}

#[tokio::test]
async fn test_repeated_questions_are_reproducible() -> Result<()> {
    let mut session = histogram_session(16)?;
    session
        .index_documents(documents(&[
            "The Rust compiler is called rustc. Cargo drives rustc for you.",
        ]))
        .await?;

    let first = session.ask("What is the compiler called?", None).await?;
    let second = session.ask("What is the compiler called?", None).await?;
    assert_eq!(first.text, second.text);
    assert_eq!(first.sources, second.sources);
    Ok(())
}

#[tokio::test]
async fn test_save_and_load_round_trip() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("docqa.index");

    let mut session = histogram_session(10)?;
    session.index_documents(documents(&[SCENARIO_TEXT])).await?;
    session.save_index(&path)?;
    let before = session.search("a test", 3).await?;

    let mut restored = histogram_session(10)?;
    restored.load_index(&path)?;
    assert_eq!(restored.state(), SessionState::Ready);
    assert_eq!(restored.chunks(), session.chunks());

    let after = restored.search("a test", 3).await?;
    assert_eq!(before.len(), after.len());
    for (a, b) in before.neighbors.iter().zip(&after.neighbors) {
        assert_eq!(a.id, b.id);
        assert!((a.distance - b.distance).abs() < 1e-5);
    }
    Ok(())
}

#[tokio::test]
async fn test_corrupt_index_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("docqa.index");

    let mut session = histogram_session(10)?;
    session.index_documents(documents(&[SCENARIO_TEXT])).await?;
    session.save_index(&path)?;

    let mut bytes = std::fs::read(&path)?;
    bytes[20] ^= 0xff;
    std::fs::write(&path, bytes)?;

    let mut restored = histogram_session(10)?;
    let err = restored.load_index(&path).unwrap_err();
    assert!(matches!(err, DocQaError::IndexFormat(_)));
    assert_eq!(restored.state(), SessionState::Idle);
    Ok(())
}

#[tokio::test]
async fn test_files_to_answer() -> Result<()> {
    let dir = TempDir::new()?;
    let notes = dir.path().join("notes.txt");
    std::fs::write(
        &notes,
        "Tokio is an asynchronous runtime.\n\nSerde serializes data structures.\n",
    )?;
    let missing = dir.path().join("missing.txt");

    let mut session = histogram_session(512)?;
    let report = session
        .index_documents(load_documents(&[&notes, &missing]))
        .await?;
    assert_eq!(report.documents, 1);
    assert_eq!(report.failures.len(), 1);

    let answer = session
        .ask(
            "What does Serde do?",
            Some("Serde serializes data structures."),
        )
        .await?;
    assert_eq!(answer.text, "Serde serializes data structures.");
    let scores = answer.scores.expect("reference was supplied");
    assert!((scores.rouge_l.fmeasure - 1.0).abs() < 1e-9);
    assert!(answer.sources[0].documents[0].ends_with("notes.txt"));
    Ok(())
}

#[test]
fn test_chunking_completeness() {
    let text = "The quick brown fox jumps over the lazy dog. ✓ Done.";
    for max_len in 1..=text.chars().count() + 2 {
        let chunks = chunk(text, max_len);
        let joined: String = chunks.iter().map(|c| c.text.as_str()).collect();

        assert_eq!(joined, text);
        assert_eq!(chunks.len(), text.chars().count().div_ceil(max_len));
        assert!(chunks.iter().all(|c| c.text.chars().count() <= max_len));
    }
    assert!(chunk("", 10).is_empty());
}
