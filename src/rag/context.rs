//! Context assembly from retrieved chunks

use crate::cli::output::truncate_str;
use crate::errors::DocQaError;
use crate::errors::Result;
use crate::models::AnswerSource;
use crate::models::Chunk;
use crate::models::Corpus;
use crate::models::RetrievalResult;

/// Joins retrieved chunk texts into a single context string
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    separator: String,
}

impl ContextAssembler {
    /// Create a new context assembler
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    /// Concatenate chunk texts in rank order, best match first
    ///
    /// # Errors
    /// - `ChunkNotFound` if a retrieved id has no chunk, which means the index
    ///   and chunk list were built from different corpora
    pub fn assemble(&self, result: &RetrievalResult, chunks: &[Chunk]) -> Result<String> {
        let texts = result
            .ids()
            .map(|id| {
                chunks
                    .get(id)
                    .map(|chunk| chunk.text.as_str())
                    .ok_or(DocQaError::ChunkNotFound(id))
            })
            .collect::<Result<Vec<&str>>>()?;

        Ok(texts.join(&self.separator))
    }

    /// Describe each retrieved chunk for display alongside an answer
    #[must_use]
    pub fn sources(
        &self,
        result: &RetrievalResult,
        chunks: &[Chunk],
        corpus: &Corpus,
    ) -> Vec<AnswerSource> {
        result
            .neighbors
            .iter()
            .filter_map(|neighbor| {
                let chunk = chunks.get(neighbor.id)?;
                Some(AnswerSource {
                    chunk: neighbor.id,
                    distance: neighbor.distance,
                    documents: corpus
                        .sources_for(chunk.start, chunk.end)
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                    preview: truncate_str(&chunk.text, 80),
                })
            })
            .collect()
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(". ")
    }
}
