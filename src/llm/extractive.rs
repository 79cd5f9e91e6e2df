//! Offline extractive answerer
//!
//! Picks the context sentence sharing the most words with the question and
//! returns it, capped at `max_length` words. Ties go to the earlier sentence,
//! which comes from the higher-ranked chunk.

use std::collections::HashSet;

use async_trait::async_trait;

use super::AnswerGenerator;
use super::GenerationRequest;
use crate::errors::DocQaError;
use crate::errors::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractiveGenerator;

impl ExtractiveGenerator {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Best-matching sentence of `context` for `question`
    #[must_use]
    pub fn extract(context: &str, question: &str, max_words: usize) -> Option<String> {
        let question_words = words(question);

        let best = split_sentences(context)
            .into_iter()
            .enumerate()
            .map(|(pos, sentence)| {
                let overlap = words(sentence).intersection(&question_words).count();
                (overlap, pos, sentence)
            })
            .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1)))?;

        let answer = best
            .2
            .split_whitespace()
            .take(max_words)
            .collect::<Vec<_>>()
            .join(" ");
        (!answer.is_empty()).then_some(answer)
    }
}

#[async_trait]
impl AnswerGenerator for ExtractiveGenerator {
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String> {
        Self::extract(request.context, request.question, request.max_length).ok_or_else(|| {
            DocQaError::GenerationError("context contains no sentences to extract".to_string())
        })
    }

    fn name(&self) -> &str {
        "extractive"
    }
}

fn split_sentences(text: &str) -> Vec<&str> {
    text.split_inclusive(['.', '?', '!', '\n'])
        .map(str::trim)
        .filter(|s| s.chars().any(char::is_alphanumeric))
        .collect()
}

fn words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_best_sentence() {
        let context = "Rust was first released in 2015. The borrow checker enforces ownership. Cargo builds crates.";
        let answer = ExtractiveGenerator::extract(context, "What does the borrow checker enforce?", 100);

        assert_eq!(answer.as_deref(), Some("The borrow checker enforces ownership."));
    }

    #[test]
    fn test_ties_prefer_earlier_sentence() {
        let context = "Alpha one. Alpha two.";
        let answer = ExtractiveGenerator::extract(context, "alpha", 100);
        assert_eq!(answer.as_deref(), Some("Alpha one."));
    }

    #[test]
    fn test_caps_word_count() {
        let context = "one two three four five six.";
        let answer = ExtractiveGenerator::extract(context, "three", 3);
        assert_eq!(answer.as_deref(), Some("one two three"));
    }

    #[tokio::test]
    async fn test_empty_context_is_generation_error() {
        let request = GenerationRequest {
            prompt: "",
            max_length: 10,
            context: "",
            question: "anything?",
        };
        let err = ExtractiveGenerator::new().generate(&request).await.unwrap_err();
        assert!(matches!(err, DocQaError::GenerationError(_)));
    }
}
