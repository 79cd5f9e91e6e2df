//! Offline character-frequency embedder
//!
//! Each text becomes an L2-normalised histogram over `a-z`, `0-9`, space, and a
//! catch-all bucket. Letters are folded to lower case. Lexically similar texts
//! land close together, which is enough to exercise retrieval without a model.

use async_trait::async_trait;

use super::Embedder;
use crate::errors::Result;

/// Number of histogram buckets
pub const HISTOGRAM_DIMENSION: usize = 26 + 10 + 2;

const SPACE_BUCKET: usize = 36;
const OTHER_BUCKET: usize = 37;

/// Deterministic bag-of-characters embedder
#[derive(Debug, Clone, Copy, Default)]
pub struct HistogramEmbedder;

impl HistogramEmbedder {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Embed one text
    #[must_use]
    pub fn embed(text: &str) -> Vec<f32> {
        let mut histogram = vec![0f32; HISTOGRAM_DIMENSION];

        for c in text.chars().flat_map(char::to_lowercase) {
            let bucket = match c {
                'a'..='z' => c as usize - 'a' as usize,
                '0'..='9' => 26 + (c as usize - '0' as usize),
                ' ' => SPACE_BUCKET,
                _ => OTHER_BUCKET,
            };
            histogram[bucket] += 1.0;
        }

        let norm = histogram.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut histogram {
                *value /= norm;
            }
        }
        histogram
    }
}

#[async_trait]
impl Embedder for HistogramEmbedder {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::embed(t)).collect())
    }

    fn name(&self) -> &str {
        "histogram"
    }
}
