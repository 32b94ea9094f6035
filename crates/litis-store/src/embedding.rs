//! Embedding Model for Query Vectorization
//!
//! Semantic retrieval compares a query vector against the chunk vectors
//! the upstream embedding worker stored with each chunk. Chunk vectors
//! arrive from outside; this module only vectorizes the retrieval queries,
//! behind the `EmbeddingModel` trait so a real model can be plugged in.
//!
//! The bundled `HashEmbedder` produces deterministic, normalized vectors
//! from text hashing. It carries no semantics but keeps the full pipeline
//! runnable and testable without model files or network calls.
//!
//! # Examples
//!
//! ```
//! use litis_store::embedding::{EmbeddingModel, HashEmbedder};
//!
//! let model = HashEmbedder::new(384);
//! let vector = model.embed("salario diario").unwrap();
//! assert_eq!(vector.len(), 384);
//! assert_eq!(vector, model.embed("salario diario").unwrap());
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Errors that can occur during embedding generation
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Invalid input text
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model inference error
    #[error("Model inference failed: {0}")]
    InferenceFailed(String),
}

/// Trait for query embedding models
pub trait EmbeddingModel {
    /// Generate an embedding vector for the given text
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Dimension of the vectors this model produces
    fn dimension(&self) -> usize;
}

/// Deterministic hash-based embedder
///
/// Hashes the input with per-component seeds and normalizes the result to
/// unit length. Same text always yields the same vector.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    /// Create a hash embedder with the given dimension
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn hash_with_seed(text: &str, seed: u64) -> f32 {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        seed.hash(&mut hasher);
        let hash_value = hasher.finish();

        // Map the hash onto [-1, 1]
        let normalized = (hash_value as f64 / u64::MAX as f64) * 2.0 - 1.0;
        normalized as f32
    }
}

impl EmbeddingModel for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "Empty text cannot be embedded".to_string(),
            ));
        }

        let mut embedding = Vec::with_capacity(self.dimension);
        for i in 0..self.dimension {
            embedding.push(Self::hash_with_seed(text, i as u64));
        }

        // Normalize to unit length for cosine similarity
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut embedding {
                *value /= magnitude;
            }
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Cosine similarity between two vectors, in [-1, 1].
///
/// Returns 0.0 for zero-magnitude vectors. Vectors of different lengths
/// are considered maximally dissimilar rather than a panic: chunk vectors
/// come from an external worker and may have been produced by a model
/// with a different dimension.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return -1.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}
