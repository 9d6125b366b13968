//! Exact nearest-neighbour search over one batch of embeddings.
//! Built per query from a session's cached vectors; never updated in place.

use std::cmp::Ordering;

/// Flat L2 index. Vectors are stored row-major in one buffer.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    dim: usize,
    len: usize,
    data: Vec<f32>,
}

impl SimilarityIndex {
    /// Builds an index over exactly `vectors`. All must share one dimension.
    pub fn build(vectors: &[Vec<f32>]) -> Result<Self, IndexError> {
        let dim = vectors.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(dim * vectors.len());
        for v in vectors {
            if v.len() != dim {
                return Err(IndexError::DimensionMismatch {
                    expected: dim,
                    found: v.len(),
                });
            }
            data.extend_from_slice(v);
        }
        Ok(Self {
            dim,
            len: vectors.len(),
            data,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of indexed vectors.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Indices of the `k` vectors nearest to `query`, nearest first.
    /// Returns every index when `k` exceeds the batch size.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<usize>, IndexError> {
        Ok(self
            .search_with_distances(query, k)?
            .into_iter()
            .map(|(i, _)| i)
            .collect())
    }

    /// Like [`search`](Self::search), paired with squared L2 distances.
    /// Equal distances keep batch order.
    pub fn search_with_distances(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, IndexError> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dim {
            return Err(IndexError::DimensionMismatch {
                expected: self.dim,
                found: query.len(),
            });
        }
        let k = k.min(self.len);
        if k == 0 {
            return Ok(Vec::new());
        }
        let mut scored: Vec<(usize, f32)> = (0..self.len)
            .map(|i| (i, squared_l2(self.row(i), query)))
            .collect();
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_distance_then_index);
            scored.truncate(k);
        }
        scored.sort_unstable_by(by_distance_then_index);
        Ok(scored)
    }

    fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }
}

fn by_distance_then_index(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    a.1.total_cmp(&b.1).then(a.0.cmp(&b.0))
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("embedding dimension mismatch: index has {expected}, got {found}")]
    DimensionMismatch { expected: usize, found: usize },
}
