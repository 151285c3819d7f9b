// src/embed.rs
//! Embedding boundary: text in, fixed-dimension unit vector out.
//!
//! The provider is swappable (local model, remote service) without touching
//! dedupe logic; the only hard requirements are batchability, a fixed
//! dimension, and determinism — identical text and provider version must
//! always produce the identical vector, because dedupe results have to be
//! reproducible run to run.
//!
//! `HashingEmbedder` is the built-in default: signed token feature hashing
//! over a unicode tokenizer. No network, no model files, fully deterministic.
//! It is deliberately crude semantically but exact on near-identical text,
//! which is what the duplicate band cares about.

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

/// Maps item text to fixed-dimension unit vectors, one per input.
///
/// A `None` slot means embedding failed for that text (empty input, provider
/// error); the caller treats such items as trivially unique singletons rather
/// than aborting the batch.
pub trait EmbeddingProvider {
    fn dimension(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> Vec<Option<Vec<f32>>>;
}

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    // \w covers [A-Za-z0-9_]; (?u) enables Unicode
    Regex::new(r"(?u)\b\w+\b").expect("tokenizer regex")
});

/// Lowercased word tokens of `input`.
pub fn tokenize(input: &str) -> Vec<String> {
    TOKEN_RE
        .find_iter(input)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Deterministic local embedder: each token hashes (SHA-256) to a bucket and
/// a sign; token counts accumulate into the bucket and the result is L2
/// normalized so cosine similarity reduces to a dot product.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

pub const DEFAULT_EMBEDDING_DIMENSION: usize = 256;

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIMENSION)
    }
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn embed_one(&self, text: &str) -> Option<Vec<f32>> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return None;
        }

        let mut vector = vec![0.0f32; self.dimension];
        for token in &tokens {
            let digest = Sha256::digest(token.as_bytes());
            let bucket = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
                as usize
                % self.dimension;
            let sign = if digest[4] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm <= f32::EPSILON {
            // Possible when signed counts cancel out exactly; rare but real.
            return None;
        }
        for v in &mut vector {
            *v /= norm;
        }
        Some(vector)
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_batch(&self, texts: &[String]) -> Vec<Option<Vec<f32>>> {
        texts.iter().map(|t| self.embed_one(t)).collect()
    }
}
