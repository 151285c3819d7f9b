// src/similarity.rs
//! Dense pairwise cosine similarity over a batch of unit vectors.
//!
//! For the sizes this crate handles (hundreds of items) a full N×N matrix is
//! fine; `from_rows` exists so a sub-quadratic nearest-neighbor backend can
//! hand in its own precomputed matrix without touching dedupe.

use tracing::debug;

/// Symmetric N×N similarity matrix with a unit diagonal.
///
/// Items whose embedding failed are "incomparable": their similarity to every
/// other item reads 0.0, which makes them trivially unique singletons
/// downstream.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    n: usize,
    data: Vec<f32>,
    comparable: Vec<bool>,
}

impl SimilarityMatrix {
    /// Build from one optional embedding per item. Vectors are assumed to be
    /// unit-normalized, so cosine similarity is a plain dot product.
    pub fn from_embeddings(embeddings: &[Option<Vec<f32>>]) -> Self {
        let n = embeddings.len();
        let comparable: Vec<bool> = embeddings.iter().map(|e| e.is_some()).collect();
        let mut data = vec![0.0f32; n * n];

        for i in 0..n {
            data[i * n + i] = 1.0;
            let Some(a) = &embeddings[i] else { continue };
            for j in (i + 1)..n {
                let Some(b) = &embeddings[j] else { continue };
                let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
                let s = dot.clamp(-1.0, 1.0);
                data[i * n + j] = s;
                data[j * n + i] = s;
            }
        }

        debug!(items = n, "built similarity matrix");
        Self { n, data, comparable }
    }

    /// Build from precomputed rows (alternative backend or tests). The input
    /// is symmetrized and the diagonal forced to 1.0 so every consumer sees
    /// the same invariants regardless of the producer.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Self {
        let n = rows.len();
        let mut data = vec![0.0f32; n * n];
        for (i, row) in rows.iter().enumerate() {
            for (j, &v) in row.iter().enumerate().take(n) {
                data[i * n + j] = v;
            }
        }
        for i in 0..n {
            data[i * n + i] = 1.0;
            for j in (i + 1)..n {
                let s = data[i * n + j].max(data[j * n + i]);
                data[i * n + j] = s;
                data[j * n + i] = s;
            }
        }
        Self {
            n,
            data,
            comparable: vec![true; n],
        }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Similarity of items `i` and `j`; 1.0 on the diagonal, 0.0 when either
    /// item is incomparable.
    pub fn get(&self, i: usize, j: usize) -> f32 {
        if i == j {
            return 1.0;
        }
        if !self.comparable[i] || !self.comparable[j] {
            return 0.0;
        }
        self.data[i * self.n + j]
    }

    /// False when the item's embedding failed.
    pub fn is_comparable(&self, i: usize) -> bool {
        self.comparable[i]
    }
}
