//! Core data types shared by ingestion, retrieval, and evaluation

use std::time::Duration;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Plain text of one source document, already extracted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub source: String,
    pub text: String,
}

impl Document {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }
}

/// A document whose extraction failed upstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub source: String,
    pub message: String,
}

/// Outcome of extracting one document
pub type ExtractedDocument = std::result::Result<Document, DocumentFailure>;

/// Character span a document occupies inside the corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSpan {
    pub source: String,
    pub start: usize,
    pub end: usize,
}

/// All successfully extracted documents joined into one text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpus {
    pub text: String,
    pub spans: Vec<DocumentSpan>,
}

impl Corpus {
    /// Join documents with a single space, recording each document's span
    #[must_use]
    pub fn from_documents(documents: &[Document]) -> Self {
        let mut text = String::new();
        let mut spans = Vec::with_capacity(documents.len());
        let mut offset = 0;

        for (idx, document) in documents.iter().enumerate() {
            if idx > 0 {
                text.push(' ');
                offset += 1;
            }
            let len = document.text.chars().count();
            text.push_str(&document.text);
            spans.push(DocumentSpan {
                source: document.source.clone(),
                start: offset,
                end: offset + len,
            });
            offset += len;
        }

        Self { text, spans }
    }

    /// Length in characters
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.spans.last().map_or(0, |span| span.end)
    }

    /// Sources of all documents overlapping the half-open character range
    #[must_use]
    pub fn sources_for(&self, start: usize, end: usize) -> Vec<&str> {
        self.spans
            .iter()
            .filter(|span| span.start < end && start < span.end)
            .map(|span| span.source.as_str())
            .collect()
    }
}

/// Fixed-size unit of the corpus used as the atomic retrievable item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Ordinal position; equals the chunk's id in the vector index
    pub index: usize,
    pub text: String,
    /// Start character offset in the corpus
    pub start: usize,
    /// End character offset in the corpus (exclusive)
    pub end: usize,
}

impl Chunk {
    /// Length in characters
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }
}

/// One hit returned by the vector index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: usize,
    /// Squared L2 distance to the query
    pub distance: f32,
}

/// Hits ordered by ascending distance, at most `k` long
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub neighbors: Vec<Neighbor>,
}

impl RetrievalResult {
    #[must_use]
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.neighbors.iter().map(|n| n.id)
    }
}

/// Precision, recall, and F-measure of one ROUGE variant
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RougeScore {
    pub precision: f64,
    pub recall: f64,
    pub fmeasure: f64,
}

/// Reference-based quality scores for one answer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub rouge1: RougeScore,
    #[serde(rename = "rougeL")]
    pub rouge_l: RougeScore,
}

/// Retrieved chunk as reported alongside an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerSource {
    pub chunk: usize,
    pub distance: f32,
    pub documents: Vec<String>,
    pub preview: String,
}

/// Generated answer for one query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub question: String,
    pub text: String,
    /// Time spent in the generator call
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
    /// Time from embedding the question through scoring
    #[serde(with = "duration_secs")]
    pub total_elapsed: Duration,
    pub sources: Vec<AnswerSource>,
    pub scores: Option<ScoreReport>,
    /// User-supplied accuracy rating in [1, 5]; recorded only
    pub rating: Option<u8>,
    pub created_at: DateTime<Utc>,
}

pub(crate) mod duration_secs {
    use std::time::Duration;

    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
