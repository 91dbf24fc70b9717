//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{check_dimensions, rank, CollectionInfo, SearchResult, StoredChunk, VectorStore};
use crate::error::{CasebookError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone)]
struct Collection {
    dimensions: Option<usize>,
    created_at: DateTime<Utc>,
    chunks: HashMap<String, StoredChunk>,
}

impl Collection {
    fn new() -> Self {
        Self {
            dimensions: None,
            created_at: Utc::now(),
            chunks: HashMap::new(),
        }
    }
}

/// In-memory vector store.
pub struct MemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Collection>>> {
        self.collections
            .read()
            .map_err(|e| CasebookError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Collection>>> {
        self.collections
            .write()
            .map_err(|e| CasebookError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn create_collection(&self, name: &str) -> Result<()> {
        self.write()?.insert(name.to_string(), Collection::new());
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<usize> {
        Ok(self
            .write()?
            .remove(name)
            .map(|c| c.chunks.len())
            .unwrap_or(0))
    }

    async fn replace_collection(&self, staging: &str, target: &str) -> Result<usize> {
        let mut collections = self.write()?;
        let staged = collections.remove(staging).ok_or_else(|| {
            CasebookError::VectorStore(format!("Collection '{}' does not exist", staging))
        })?;
        let count = staged.chunks.len();
        collections.insert(target.to_string(), staged);
        Ok(count)
    }

    async fn collection_info(&self, name: &str) -> Result<Option<CollectionInfo>> {
        Ok(self.read()?.get(name).map(|c| CollectionInfo {
            name: name.to_string(),
            chunk_count: c.chunks.len(),
            dimensions: c.dimensions,
            created_at: c.created_at,
        }))
    }

    async fn upsert(&self, collection: &str, chunk: &StoredChunk) -> Result<()> {
        let mut collections = self.write()?;
        let target = collections.get_mut(collection).ok_or_else(|| {
            CasebookError::VectorStore(format!("Collection '{}' does not exist", collection))
        })?;

        check_dimensions(collection, target.dimensions, chunk.embedding.len())?;
        target.dimensions.get_or_insert(chunk.embedding.len());
        target.chunks.insert(chunk.id.clone(), chunk.clone());
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.read()?;
        let source = collections.get(collection).ok_or_else(|| {
            CasebookError::Retrieval(format!("Collection '{}' does not exist", collection))
        })?;

        rank(
            query_embedding,
            source.chunks.values().cloned(),
            source.dimensions,
            limit,
        )
    }

    async fn ids(&self, collection: &str) -> Result<Vec<String>> {
        let collections = self.read()?;
        let mut chunks: Vec<&StoredChunk> = collections
            .get(collection)
            .map(|c| c.chunks.values().collect())
            .unwrap_or_default();
        chunks.sort_by_key(|c| c.order);
        Ok(chunks.into_iter().map(|c| c.id.clone()).collect())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        Ok(self
            .read()?
            .get(collection)
            .map(|c| c.chunks.len())
            .unwrap_or(0))
    }
}
