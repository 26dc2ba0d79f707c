//! Embedding collaborator port.
//!
//! The embedding path is an enhancement, never a gate: `lock_context` must
//! commit even when this fails, and read paths degrade to keyword search.

use async_trait::async_trait;

use crate::error::Result;

/// Dimensionality the engine stores and compares embeddings at.
pub const EMBEDDING_DIMENSIONS: usize = 1024;

/// Port for the external embedding collaborator (`embed`/`embed_batch`).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text, typically a context's `preview`, not raw
    /// content (inputs are bounded to roughly 1020 chars).
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed many texts in one round-trip.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Cosine similarity between two equal-length embeddings, in `[-1.0, 1.0]`.
/// Returns `0.0` for mismatched or zero-length inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_similarity_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_have_similarity_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn mismatched_lengths_return_zero() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    }
}
