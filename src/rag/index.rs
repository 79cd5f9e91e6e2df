//! Exact nearest-neighbour vector index
//!
//! Vectors are stored contiguously in insertion order; id `i` is the `i`-th
//! vector added and corresponds to chunk `i`. Search is a brute-force scan
//! using squared Euclidean distance.
//!
//! # File format
//! ```text
//! magic "DQIX" | version u16 | dimension u32 | count u64 | count*dimension f32 | sha256 (32 bytes)
//! ```
//! All integers and floats are little-endian. The trailing digest covers every
//! preceding byte.

use std::cmp::Ordering;
use std::path::Path;

use sha2::Digest;
use sha2::Sha256;
use tracing::debug;
use tracing::info;

use crate::errors::DocQaError;
use crate::errors::Result;
use crate::models::Neighbor;
use crate::models::RetrievalResult;

const MAGIC: &[u8; 4] = b"DQIX";
const FORMAT_VERSION: u16 = 1;
const HEADER_LEN: usize = 4 + 2 + 4 + 8;
const DIGEST_LEN: usize = 32;

/// Append-only store of equal-dimension vectors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorIndex {
    dimension: Option<usize>,
    data: Vec<f32>,
}

impl VectorIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty index with its dimension fixed up front
    #[must_use]
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: Some(dimension),
            data: Vec::new(),
        }
    }

    /// Dimension shared by every stored vector, once established
    #[must_use]
    pub const fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Number of stored vectors
    #[must_use]
    pub fn len(&self) -> usize {
        match self.dimension {
            Some(dim) if dim > 0 => self.data.len() / dim,
            _ => 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored vector by id
    #[must_use]
    pub fn vector(&self, id: usize) -> Option<&[f32]> {
        let dim = self.dimension?;
        self.data.get(id * dim..(id + 1) * dim)
    }

    /// Append vectors, assigning consecutive ids starting at `len()`
    ///
    /// The whole batch is validated before anything is stored, so a failed
    /// call leaves the index unchanged.
    ///
    /// # Errors
    /// - `DimensionMismatch` if any vector differs from the established dimension
    ///   (or from the first vector of the batch when the index is empty)
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        let Some(first) = vectors.first() else {
            return Ok(());
        };
        let expected = self.dimension.unwrap_or(first.len());

        if expected == 0 {
            return Err(DocQaError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
            return Err(DocQaError::DimensionMismatch {
                expected,
                actual: bad.len(),
            });
        }

        self.dimension = Some(expected);
        self.data.reserve(vectors.len() * expected);
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }

        debug!(
            "Added {} vectors (dimension {}), index size {}",
            vectors.len(),
            expected,
            self.len()
        );
        Ok(())
    }

    /// Return the `k` stored vectors closest to `query`
    ///
    /// Results are ordered by ascending squared L2 distance with ties broken by
    /// lower id. A `k` larger than the index returns every stored vector.
    ///
    /// # Errors
    /// - `EmptyIndex` if nothing has been stored
    /// - `DimensionMismatch` if the query dimension differs from the index
    pub fn search(&self, query: &[f32], k: usize) -> Result<RetrievalResult> {
        let dim = match self.dimension {
            Some(dim) if !self.data.is_empty() => dim,
            _ => return Err(DocQaError::EmptyIndex),
        };
        if query.len() != dim {
            return Err(DocQaError::DimensionMismatch {
                expected: dim,
                actual: query.len(),
            });
        }

        let mut neighbors: Vec<Neighbor> = self
            .data
            .chunks_exact(dim)
            .enumerate()
            .map(|(id, vector)| Neighbor {
                id,
                distance: squared_l2(query, vector),
            })
            .collect();

        neighbors.sort_by(compare_neighbors);
        neighbors.truncate(k);

        Ok(RetrievalResult { neighbors })
    }

    /// Encode the index in the binary file format
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let dimension = self.dimension.unwrap_or(0);
        let count = self.len();
        let mut buffer = Vec::with_capacity(HEADER_LEN + self.data.len() * 4 + DIGEST_LEN);

        buffer.extend_from_slice(MAGIC);
        buffer.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        buffer.extend_from_slice(&(dimension as u32).to_le_bytes());
        buffer.extend_from_slice(&(count as u64).to_le_bytes());
        for &value in &self.data {
            buffer.extend_from_slice(&value.to_le_bytes());
        }

        let digest = Sha256::digest(&buffer);
        buffer.extend_from_slice(&digest);
        buffer
    }

    /// Decode an index previously produced by [`VectorIndex::to_bytes`]
    ///
    /// # Errors
    /// - `IndexFormat` for a wrong magic, unsupported version, truncated
    ///   payload, or checksum mismatch
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN + DIGEST_LEN {
            return Err(DocQaError::IndexFormat(format!(
                "file too short ({} bytes)",
                bytes.len()
            )));
        }
        if &bytes[0..4] != MAGIC {
            return Err(DocQaError::IndexFormat("bad magic".to_string()));
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != FORMAT_VERSION {
            return Err(DocQaError::IndexFormat(format!(
                "unsupported format version {version}"
            )));
        }

        let dimension = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]) as usize;
        let mut count_bytes = [0u8; 8];
        count_bytes.copy_from_slice(&bytes[10..18]);
        let count = usize::try_from(u64::from_le_bytes(count_bytes))
            .map_err(|_| DocQaError::IndexFormat("vector count overflows usize".to_string()))?;

        let payload_len = count
            .checked_mul(dimension)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| DocQaError::IndexFormat("payload size overflows usize".to_string()))?;
        let expected_len = HEADER_LEN + payload_len + DIGEST_LEN;
        if bytes.len() != expected_len {
            return Err(DocQaError::IndexFormat(format!(
                "expected {expected_len} bytes for {count} vectors of dimension {dimension}, got {}",
                bytes.len()
            )));
        }

        let body_end = HEADER_LEN + payload_len;
        let digest = Sha256::digest(&bytes[..body_end]);
        if digest.as_slice() != &bytes[body_end..] {
            return Err(DocQaError::IndexFormat("checksum mismatch".to_string()));
        }

        let data: Vec<f32> = bytes[HEADER_LEN..body_end]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Ok(Self {
            dimension: (dimension > 0).then_some(dimension),
            data,
        })
    }

    /// Write the index to `path`
    ///
    /// # Errors
    /// - File write errors
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes();
        std::fs::write(path.as_ref(), &bytes)?;
        info!(
            "Saved index with {} vectors to {} (sha256 {})",
            self.len(),
            path.as_ref().display(),
            hex::encode(&bytes[bytes.len() - DIGEST_LEN..])
        );
        Ok(())
    }

    /// Read an index from `path`
    ///
    /// # Errors
    /// - File read errors
    /// - `IndexFormat` if the file is not a valid index
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let index = Self::from_bytes(&bytes)?;
        info!(
            "Loaded index with {} vectors from {}",
            index.len(),
            path.as_ref().display()
        );
        Ok(index)
    }
}

/// Squared Euclidean distance
#[must_use]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

fn compare_neighbors(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> VectorIndex {
        let mut index = VectorIndex::new();
        index
            .add(&[
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.0, 0.0, 1.0],
                vec![0.5, 0.5, 0.0],
            ])
            .unwrap();
        index
    }

    #[test]
    fn test_add_assigns_consecutive_ids() {
        let mut index = sample_index();
        assert_eq!(index.len(), 4);

        index.add(&[vec![2.0, 2.0, 2.0]]).unwrap();
        assert_eq!(index.len(), 5);
        assert_eq!(index.vector(4), Some(&[2.0, 2.0, 2.0][..]));
    }

    #[test]
    fn test_add_rejects_mismatched_dimension() {
        let mut index = sample_index();
        let err = index.add(&[vec![1.0, 1.0]]).unwrap_err();

        assert!(matches!(
            err,
            DocQaError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_add_rejects_mixed_batch_atomically() {
        let mut index = VectorIndex::new();
        let err = index
            .add(&[vec![1.0, 2.0], vec![1.0, 2.0, 3.0]])
            .unwrap_err();

        assert!(matches!(err, DocQaError::DimensionMismatch { .. }));
        assert!(index.is_empty());
        assert_eq!(index.dimension(), None);
    }

    #[test]
    fn test_search_orders_by_distance() {
        let index = sample_index();
        let result = index.search(&[0.6, 0.4, 0.0], 2).unwrap();

        assert_eq!(result.ids().collect::<Vec<_>>(), vec![3, 0]);
        assert!(result.neighbors[0].distance <= result.neighbors[1].distance);
    }

    #[test]
    fn test_search_ties_broken_by_lower_id() {
        let mut index = VectorIndex::new();
        index
            .add(&[vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0]])
            .unwrap();

        let result = index.search(&[0.0, 0.0], 3).unwrap();
        assert_eq!(result.ids().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_search_clamps_k() {
        let index = sample_index();
        let result = index.search(&[0.0, 0.0, 0.0], 50).unwrap();
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_search_empty_index() {
        let index = VectorIndex::new();
        assert!(matches!(
            index.search(&[1.0], 1),
            Err(DocQaError::EmptyIndex)
        ));
    }

    #[test]
    fn test_search_query_dimension_mismatch() {
        let index = sample_index();
        assert!(matches!(
            index.search(&[1.0, 0.0], 1),
            Err(DocQaError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_bytes_roundtrip_search_consistency() {
        let index = sample_index();
        let restored = VectorIndex::from_bytes(&index.to_bytes()).unwrap();

        assert_eq!(restored, index);
        let query = [0.6, 0.4, 0.0];
        assert_eq!(
            index.search(&query, 2).unwrap(),
            restored.search(&query, 2).unwrap()
        );
    }

    #[test]
    fn test_empty_index_roundtrip() {
        let index = VectorIndex::new();
        let restored = VectorIndex::from_bytes(&index.to_bytes()).unwrap();
        assert!(restored.is_empty());
    }

    #[test]
    fn test_invalid_magic_fails() {
        let mut bytes = sample_index().to_bytes();
        bytes[0] = 0x00;
        assert!(matches!(
            VectorIndex::from_bytes(&bytes),
            Err(DocQaError::IndexFormat(_))
        ));
    }

    #[test]
    fn test_corrupted_payload_fails_checksum() {
        let mut bytes = sample_index().to_bytes();
        bytes[HEADER_LEN + 3] ^= 0xFF;
        assert!(matches!(
            VectorIndex::from_bytes(&bytes),
            Err(DocQaError::IndexFormat(_))
        ));
    }

    #[test]
    fn test_truncated_file_fails() {
        let bytes = sample_index().to_bytes();
        assert!(VectorIndex::from_bytes(&bytes[..bytes.len() - 5]).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docqa.index");
        let index = sample_index();

        index.save(&path).unwrap();
        let loaded = VectorIndex::load(&path).unwrap();
        assert_eq!(loaded.len(), 4);
        assert_eq!(loaded.dimension(), Some(3));
    }
}
