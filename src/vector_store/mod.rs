//! Vector store abstraction for Casebook.
//!
//! Stores named collections of (chunk, embedding, metadata) records and
//! answers top-K similarity queries against them.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::error::{CasebookError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chunk persisted with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    /// Chunk ID, unique within a collection (e.g. `chunk_12`).
    pub id: String,
    /// Text content of this chunk.
    pub text: String,
    /// Short locator shown with search results.
    pub source: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// Position of the chunk in the source document.
    pub order: i64,
    /// When this chunk was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl StoredChunk {
    pub fn new(id: String, text: String, source: String, embedding: Vec<f32>, order: i64) -> Self {
        Self {
            id,
            text,
            source,
            embedding,
            order,
            indexed_at: Utc::now(),
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched chunk.
    pub chunk: StoredChunk,
    /// Cosine similarity (higher is better).
    pub score: f32,
}

/// Summary information about a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub chunk_count: usize,
    /// Embedding dimensionality, unknown until the first upsert.
    pub dimensions: Option<usize>,
    pub created_at: DateTime<Utc>,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create an empty collection, discarding any existing one of the same name.
    async fn create_collection(&self, name: &str) -> Result<()>;

    /// Delete a collection and its chunks. Returns the number of chunks removed.
    async fn delete_collection(&self, name: &str) -> Result<usize>;

    /// Atomically make `staging` the new contents of `target`.
    ///
    /// The previous generation of `target` is dropped and `staging` ceases to
    /// exist. Readers see either the old or the new generation, never a mix.
    async fn replace_collection(&self, staging: &str, target: &str) -> Result<usize>;

    /// Get collection metadata, or `None` if it does not exist.
    async fn collection_info(&self, name: &str) -> Result<Option<CollectionInfo>>;

    /// Insert or replace a chunk (keyed by id) in an existing collection.
    async fn upsert(&self, collection: &str, chunk: &StoredChunk) -> Result<()>;

    /// Return the `limit` chunks closest to the query, best first.
    ///
    /// No minimum score is applied.
    async fn query(
        &self,
        collection: &str,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>>;

    /// All chunk ids in document order.
    async fn ids(&self, collection: &str) -> Result<Vec<String>>;

    /// Number of chunks in a collection (0 if it does not exist).
    async fn count(&self, collection: &str) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Score candidates against a query and keep the best `limit`.
///
/// Ties are broken by document order so results are deterministic.
pub(crate) fn rank(
    query_embedding: &[f32],
    candidates: impl IntoIterator<Item = StoredChunk>,
    dimensions: Option<usize>,
    limit: usize,
) -> Result<Vec<SearchResult>> {
    if let Some(dims) = dimensions {
        if dims != query_embedding.len() {
            return Err(CasebookError::Retrieval(format!(
                "Query embedding has {} dimensions but the collection stores {}",
                query_embedding.len(),
                dims
            )));
        }
    }

    let mut results: Vec<SearchResult> = candidates
        .into_iter()
        .map(|chunk| {
            let score = cosine_similarity(query_embedding, &chunk.embedding);
            SearchResult { chunk, score }
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.chunk.order.cmp(&b.chunk.order))
    });
    results.truncate(limit);

    Ok(results)
}

/// Reject an upsert whose embedding size differs from the collection's.
pub(crate) fn check_dimensions(collection: &str, expected: Option<usize>, actual: usize) -> Result<()> {
    match expected {
        Some(dims) if dims != actual => Err(CasebookError::VectorStore(format!(
            "Collection '{}' stores {}-dimensional embeddings, got {}",
            collection, dims, actual
        ))),
        _ => Ok(()),
    }
}
