//! Flat exact-search L2 index.
//!
//! Every query is compared against every stored row (O(N·D)). Corpora served
//! here are small enough that exactness is cheaper than tuning an approximate
//! structure.

use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::types::Neighbor;
use ragqa_core::{Error, Result};

const MAGIC: &[u8; 4] = b"RQIX";
const FORMAT_VERSION: u32 = 1;
/// magic + version + dimension + row count
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

/// Dense row-major matrix of vectors, one row per store position.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatL2Index {
    dimension: usize,
    vectors: Array2<f32>,
}

impl FlatL2Index {
    /// Allocate an empty index fixed to `dimension`.
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::Configuration(
                "vector dimension must be positive".into(),
            ));
        }
        Ok(Self {
            dimension,
            vectors: Array2::zeros((0, dimension)),
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vectors.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector stored at `position`.
    pub fn vector(&self, position: usize) -> Option<ArrayView1<'_, f32>> {
        (position < self.len()).then(|| self.vectors.row(position))
    }

    /// Append vectors in order. Nothing is appended unless every vector has
    /// the index dimension.
    pub fn add(&mut self, vectors: &[Array1<f32>]) -> Result<()> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: bad.len(),
            });
        }
        for v in vectors {
            self.vectors
                .push(Axis(0), v.view())
                .map_err(|e| Error::Internal(format!("Index append failed: {}", e)))?;
        }
        Ok(())
    }

    /// The `top_k` rows nearest to `query` by squared Euclidean distance,
    /// nearest first. Equal distances keep insertion order.
    pub fn search(&self, query: &Array1<f32>, top_k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if self.is_empty() {
            return Err(Error::EmptyStore);
        }

        let mut hits: Vec<Neighbor> = self
            .vectors
            .rows()
            .into_iter()
            .enumerate()
            .map(|(position, row)| Neighbor {
                position,
                distance: squared_l2(row, query.view()),
            })
            .collect();

        // sort_by is stable, so ties stay in position order
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(top_k.min(self.len()));
        Ok(hits)
    }

    /// Serialize to the on-disk blob format.
    ///
    /// Layout: `RQIX`, u32 version, u32 dimension, u64 rows, then rows of
    /// little-endian f32.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.vectors.len() * 4);
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&(self.dimension as u32).to_le_bytes());
        out.extend_from_slice(&(self.len() as u64).to_le_bytes());
        for value in self.vectors.iter() {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }

    /// Parse a blob written by [`FlatL2Index::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN || &bytes[..4] != MAGIC {
            return Err(Error::StoreCorrupt("index blob has no valid header".into()));
        }
        let version = read_u32(&bytes[4..8]);
        if version != FORMAT_VERSION {
            return Err(Error::StoreCorrupt(format!(
                "unsupported index format version {}",
                version
            )));
        }
        let dimension = read_u32(&bytes[8..12]) as usize;
        let rows = read_u64(&bytes[12..20]) as usize;
        if dimension == 0 {
            return Err(Error::StoreCorrupt("index blob has zero dimension".into()));
        }

        let body = &bytes[HEADER_LEN..];
        let expected = rows
            .checked_mul(dimension)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| Error::StoreCorrupt("index blob size overflows".into()))?;
        if body.len() != expected {
            return Err(Error::StoreCorrupt(format!(
                "index blob holds {} bytes of vectors, header promises {}",
                body.len(),
                expected
            )));
        }

        let data: Vec<f32> = body
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        let vectors = Array2::from_shape_vec((rows, dimension), data)
            .map_err(|e| Error::StoreCorrupt(format!("index blob shape: {}", e)))?;

        Ok(Self { dimension, vectors })
    }
}

fn squared_l2(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

fn read_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

fn read_u64(b: &[u8]) -> u64 {
    u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn index_with(rows: &[Array1<f32>]) -> FlatL2Index {
        let mut index = FlatL2Index::new(rows[0].len()).unwrap();
        index.add(rows).unwrap();
        index
    }

    #[test]
    fn test_search_orders_nearest_first() {
        let index = index_with(&[
            array![5.0, 5.0],
            array![1.0, 0.0],
            array![0.0, 2.0],
        ]);
        let hits = index.search(&array![0.0, 0.0], 3).unwrap();
        let positions: Vec<usize> = hits.iter().map(|h| h.position).collect();
        assert_eq!(positions, vec![1, 2, 0]);
        assert_eq!(hits[0].distance, 1.0);
        assert_eq!(hits[1].distance, 4.0);
        assert_eq!(hits[2].distance, 50.0);
    }

    #[test]
    fn test_top_k_larger_than_index_returns_all() {
        let index = index_with(&[array![0.0, 1.0], array![3.0, 0.0]]);
        let hits = index.search(&array![0.0, 0.0], 3).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].position, 0);
        assert_eq!(hits[1].position, 1);
    }

    #[test]
    fn test_ties_broken_by_position() {
        let index = index_with(&[
            array![1.0, 0.0],
            array![0.0, 1.0],
            array![-1.0, 0.0],
        ]);
        let hits = index.search(&array![0.0, 0.0], 2).unwrap();
        assert_eq!(hits[0].position, 0);
        assert_eq!(hits[1].position, 1);
    }

    #[test]
    fn test_empty_index_search_fails() {
        let index = FlatL2Index::new(3).unwrap();
        let err = index.search(&array![0.0, 0.0, 0.0], 1).unwrap_err();
        assert!(matches!(err, Error::EmptyStore));
    }

    #[test]
    fn test_add_rejects_wrong_dimension_without_partial_append() {
        let mut index = index_with(&[array![1.0, 2.0, 3.0]]);
        let err = index
            .add(&[array![0.0, 0.0, 0.0], array![1.0, 1.0]])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_blob_roundtrip_preserves_rows() {
        let index = index_with(&[array![0.25, -1.5], array![3.0, 0.125]]);
        let restored = FlatL2Index::from_bytes(&index.to_bytes()).unwrap();
        assert_eq!(restored, index);
        assert_eq!(restored.vector(1).unwrap().to_vec(), vec![3.0, 0.125]);
    }

    #[test]
    fn test_truncated_blob_is_corrupt() {
        let index = index_with(&[array![0.25, -1.5]]);
        let mut bytes = index.to_bytes();
        bytes.pop();
        assert!(matches!(
            FlatL2Index::from_bytes(&bytes),
            Err(Error::StoreCorrupt(_))
        ));
        assert!(matches!(
            FlatL2Index::from_bytes(b"nope"),
            Err(Error::StoreCorrupt(_))
        ));
    }
}
