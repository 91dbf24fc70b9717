//! Embedding generation for indexing and retrieval.
//!
//! Every chunk in a collection and every query must be embedded by the same
//! [`Embedder`]; vectors from different embedders are not comparable.

mod hashing;
mod openai;

pub use hashing::HashingEmbedder;
pub use openai::OpenAIEmbedder;

use crate::config::{EmbeddingProvider, EmbeddingSettings};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

/// Create the embedder selected in the settings.
pub fn create_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    match settings.provider {
        EmbeddingProvider::OpenAI => Ok(Arc::new(OpenAIEmbedder::from_settings(settings)?)),
        EmbeddingProvider::Hashing => {
            Ok(Arc::new(HashingEmbedder::new(settings.dimensions as usize)))
        }
    }
}
