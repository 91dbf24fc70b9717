//! Local feature-hashing embedder.
//!
//! Maps lowercase word unigrams and bigrams into a fixed number of signed
//! buckets and L2-normalizes the result. No model download or network access,
//! fully deterministic, useful for offline runs and tests. Retrieval quality is
//! lexical, not semantic.

use super::Embedder;
use crate::error::{CasebookError, Result};
use async_trait::async_trait;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Deterministic bag-of-words embedder.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn fnv1a(bytes: &[u8]) -> u64 {
        bytes.iter().fold(FNV_OFFSET, |hash, b| {
            (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME)
        })
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = Self::fnv1a(feature.as_bytes());
        let bucket = (hash % self.dimensions as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        let words: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
            .collect();

        for word in &words {
            self.add_feature(&mut vector, word, 1.0);
        }
        for pair in words.windows(2) {
            self.add_feature(&mut vector, &format!("{} {}", pair[0], pair[1]), 0.5);
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.dimensions == 0 {
            return Err(CasebookError::Embedding(
                "Hashing embedder needs at least one dimension".to_string(),
            ));
        }
        Ok(self.vectorize(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::cosine_similarity;

    #[tokio::test]
    async fn test_identical_text_identical_vector() {
        let embedder = HashingEmbedder::new(128);
        let a = embedder.embed("Chronic obstructive pulmonary disease").await.unwrap();
        let b = embedder.embed("Chronic obstructive pulmonary disease").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 128);
    }

    #[tokio::test]
    async fn test_related_text_scores_higher() {
        let embedder = HashingEmbedder::new(256);
        let query = embedder.embed("asthma inhaler dosage").await.unwrap();
        let related = embedder
            .embed("The asthma patient was given an inhaler with a low dosage.")
            .await
            .unwrap();
        let unrelated = embedder
            .embed("Fracture of the left femur after a fall.")
            .await
            .unwrap();

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(16);
        let v = embedder.embed("  ...  ").await.unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let embedder = HashingEmbedder::new(0);
        assert!(tokio_test::block_on(embedder.embed("text")).is_err());
    }
}
