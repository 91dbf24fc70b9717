//! Builds the named collection from a chunk list.
//!
//! Chunks are embedded one at a time into a staging collection, which then
//! replaces the live collection in a single swap. A failure part-way through
//! leaves the previous generation untouched.

use crate::chunking::{load_chunks, Chunk};
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{StoredChunk, VectorStore};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Outcome of an indexing run.
#[derive(Debug, Clone)]
pub struct IndexReport {
    pub collection: String,
    pub chunks_indexed: usize,
    /// Whether an older generation of the collection was replaced.
    pub replaced_previous: bool,
}

/// Embeds chunks and (re)builds a collection.
pub struct Indexer {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    collection: String,
}

impl Indexer {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>, collection: &str) -> Self {
        Self {
            store,
            embedder,
            collection: collection.to_string(),
        }
    }

    fn staging_name(&self) -> String {
        format!("{}__staging", self.collection)
    }

    /// Load a chunk file and index it.
    ///
    /// Load failures abort before any store work happens.
    pub async fn index_file<F>(&self, path: &Path, on_progress: F) -> Result<IndexReport>
    where
        F: FnMut(usize, usize) + Send,
    {
        let chunks = load_chunks(path)?;
        self.index(&chunks, on_progress).await
    }

    /// Embed every chunk sequentially and swap the result in as the collection.
    #[instrument(skip(self, chunks, on_progress), fields(collection = %self.collection, count = chunks.len()))]
    pub async fn index<F>(&self, chunks: &[Chunk], mut on_progress: F) -> Result<IndexReport>
    where
        F: FnMut(usize, usize) + Send,
    {
        let staging = self.staging_name();
        let replaced_previous = self.store.collection_info(&self.collection).await?.is_some();

        self.store.create_collection(&staging).await?;

        if let Err(e) = self.fill(&staging, chunks, &mut on_progress).await {
            if let Err(cleanup) = self.store.delete_collection(&staging).await {
                warn!("Failed to remove staging collection {}: {}", staging, cleanup);
            }
            return Err(e);
        }

        let chunks_indexed = self.store.replace_collection(&staging, &self.collection).await?;
        info!(
            "Indexed {} chunks into {}{}",
            chunks_indexed,
            self.collection,
            if replaced_previous { " (replaced previous generation)" } else { "" }
        );

        Ok(IndexReport {
            collection: self.collection.clone(),
            chunks_indexed,
            replaced_previous,
        })
    }

    async fn fill<F>(&self, staging: &str, chunks: &[Chunk], on_progress: &mut F) -> Result<()>
    where
        F: FnMut(usize, usize) + Send,
    {
        let total = chunks.len();

        for (index, chunk) in chunks.iter().enumerate() {
            let embedding = self.embedder.embed(&chunk.text).await?;
            let order = chunk.position().unwrap_or(index + 1) as i64;

            let stored = StoredChunk::new(
                chunk.id.clone(),
                chunk.text.clone(),
                chunk.source_locator(),
                embedding,
                order,
            );
            self.store.upsert(staging, &stored).await?;

            on_progress(index + 1, total);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use crate::error::CasebookError;
    use crate::vector_store::{MemoryVectorStore, SqliteVectorStore};
    use async_trait::async_trait;

    fn sample_chunks() -> Vec<Chunk> {
        vec![
            Chunk::new(1, "Chronic obstructive pulmonary disease in a long-term smoker.".into()),
            Chunk::new(2, "Type 2 diabetes managed with metformin and diet.".into()),
            Chunk::new(3, "Acute appendicitis presenting with right lower quadrant pain.".into()),
        ]
    }

    /// Fails on the n-th embedding call.
    struct FailingEmbedder {
        inner: HashingEmbedder,
        fail_at: usize,
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let call = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
            if call == self.fail_at {
                return Err(CasebookError::Embedding("model crashed".into()));
            }
            self.inner.embed(text).await
        }

        fn dimensions(&self) -> usize {
            self.inner.dimensions()
        }
    }

    #[tokio::test]
    async fn test_index_then_query_exact_text_ranks_first() {
        let store = Arc::new(SqliteVectorStore::in_memory().unwrap());
        let embedder = Arc::new(HashingEmbedder::new(256));
        let indexer = Indexer::new(store.clone(), embedder.clone(), "medical_cases");

        let mut progress = Vec::new();
        let report = indexer
            .index(&sample_chunks(), |done, total| progress.push((done, total)))
            .await
            .unwrap();

        assert_eq!(report.chunks_indexed, 3);
        assert!(!report.replaced_previous);
        assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);

        for chunk in sample_chunks() {
            let query = embedder.embed(&chunk.text).await.unwrap();
            let results = store.query("medical_cases", &query, 5).await.unwrap();
            assert_eq!(results[0].chunk.id, chunk.id);
            assert_eq!(results[0].chunk.source, chunk.source_locator());
        }
    }

    #[tokio::test]
    async fn test_reindex_has_same_ids_and_count() {
        let store = Arc::new(SqliteVectorStore::in_memory().unwrap());
        let indexer = Indexer::new(store.clone(), Arc::new(HashingEmbedder::new(64)), "medical_cases");

        indexer.index(&sample_chunks(), |_, _| {}).await.unwrap();
        let first_ids = store.ids("medical_cases").await.unwrap();

        let report = indexer.index(&sample_chunks(), |_, _| {}).await.unwrap();
        assert!(report.replaced_previous);
        assert_eq!(store.count("medical_cases").await.unwrap(), 3);
        assert_eq!(store.ids("medical_cases").await.unwrap(), first_ids);
        assert_eq!(first_ids, vec!["chunk_1", "chunk_2", "chunk_3"]);
    }

    #[tokio::test]
    async fn test_rebuild_drops_stale_ids() {
        let store = Arc::new(MemoryVectorStore::new());
        let indexer = Indexer::new(store.clone(), Arc::new(HashingEmbedder::new(64)), "medical_cases");

        indexer.index(&sample_chunks(), |_, _| {}).await.unwrap();
        indexer.index(&sample_chunks()[..1], |_, _| {}).await.unwrap();

        assert_eq!(store.ids("medical_cases").await.unwrap(), vec!["chunk_1"]);
    }

    #[tokio::test]
    async fn test_failed_rebuild_keeps_previous_generation() {
        let store = Arc::new(SqliteVectorStore::in_memory().unwrap());
        Indexer::new(store.clone(), Arc::new(HashingEmbedder::new(64)), "medical_cases")
            .index(&sample_chunks(), |_, _| {})
            .await
            .unwrap();

        let failing = Arc::new(FailingEmbedder {
            inner: HashingEmbedder::new(64),
            fail_at: 2,
            calls: Default::default(),
        });
        let err = Indexer::new(store.clone(), failing, "medical_cases")
            .index(&sample_chunks()[..2], |_, _| {})
            .await
            .unwrap_err();

        assert!(matches!(err, CasebookError::Embedding(_)));
        assert_eq!(store.count("medical_cases").await.unwrap(), 3);
        assert!(store
            .collection_info("medical_cases__staging")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_index_file_load_failure_leaves_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryVectorStore::new());
        let indexer = Indexer::new(store.clone(), Arc::new(HashingEmbedder::new(64)), "medical_cases");
        indexer.index(&sample_chunks(), |_, _| {}).await.unwrap();

        let bad = dir.path().join("cases_database.json");
        std::fs::write(&bad, "not json").unwrap();

        assert!(matches!(
            indexer.index_file(&bad, |_, _| {}).await,
            Err(CasebookError::Parse(_))
        ));
        assert!(matches!(
            indexer.index_file(&dir.path().join("absent.json"), |_, _| {}).await,
            Err(CasebookError::InputNotFound(_))
        ));
        assert_eq!(store.count("medical_cases").await.unwrap(), 3);
    }
}
