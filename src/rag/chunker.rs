//! Fixed-length chunker
//!
//! Splits the corpus into consecutive, non-overlapping pieces of at most
//! `max_len` characters. No boundary awareness: a chunk may end mid-word.

use crate::models::Chunk;

/// Fixed-length character chunker
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    max_len: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(crate::config::default_chunk_length())
    }
}

impl Chunker {
    /// Create a chunker producing chunks of at most `max_len` characters
    ///
    /// A `max_len` of zero is treated as one.
    #[must_use]
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len: max_len.max(1),
        }
    }

    #[must_use]
    pub const fn max_len(&self) -> usize {
        self.max_len
    }

    /// Split `text` into `ceil(chars / max_len)` chunks, left to right
    #[must_use]
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut byte_start = 0;
        let mut char_start = 0;
        let mut count = 0;

        for (byte_idx, _) in text.char_indices() {
            if count == self.max_len {
                chunks.push(Chunk {
                    index: chunks.len(),
                    text: text[byte_start..byte_idx].to_string(),
                    start: char_start,
                    end: char_start + count,
                });
                byte_start = byte_idx;
                char_start += count;
                count = 0;
            }
            count += 1;
        }

        if count > 0 {
            chunks.push(Chunk {
                index: chunks.len(),
                text: text[byte_start..].to_string(),
                start: char_start,
                end: char_start + count,
            });
        }

        chunks
    }
}

/// Split `text` into chunks of at most `max_len` characters
#[must_use]
pub fn chunk(text: &str, max_len: usize) -> Vec<Chunk> {
    Chunker::new(max_len).chunk(text)
}
