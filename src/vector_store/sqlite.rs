//! SQLite-based vector store implementation.
//!
//! Uses SQLite with cosine similarity computed in Rust for simplicity. A
//! casebook holds a few hundred chunks, so a full scan per query is cheap.

use super::{check_dimensions, rank, CollectionInfo, SearchResult, StoredChunk, VectorStore};
use crate::error::{CasebookError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS collections (
        name TEXT PRIMARY KEY,
        dimensions INTEGER,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS chunks (
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        content TEXT NOT NULL,
        source TEXT NOT NULL,
        embedding BLOB NOT NULL,
        chunk_order INTEGER NOT NULL,
        indexed_at TEXT NOT NULL,
        PRIMARY KEY (collection, id)
    );

    CREATE INDEX IF NOT EXISTS idx_chunks_collection ON chunks(collection);
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (or create) a store at the given database file.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an existing store without creating it.
    pub fn open_existing(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CasebookError::InputNotFound(path.to_path_buf()));
        }
        Self::new(path)
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| CasebookError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn parse_timestamp(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    /// Dimensions recorded for a collection; outer `None` if it does not exist.
    fn dimensions_of(conn: &Connection, name: &str) -> Result<Option<Option<usize>>> {
        let dims = conn
            .query_row(
                "SELECT dimensions FROM collections WHERE name = ?1",
                params![name],
                |row| row.get::<_, Option<i64>>(0),
            )
            .optional()?;
        Ok(dims.map(|d| d.map(|d| d as usize)))
    }

    fn require_collection(conn: &Connection, name: &str) -> Result<Option<usize>> {
        Self::dimensions_of(conn, name)?
            .ok_or_else(|| CasebookError::VectorStore(format!("Collection '{}' does not exist", name)))
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self))]
    async fn create_collection(&self, name: &str) -> Result<()> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute("DELETE FROM chunks WHERE collection = ?1", params![name])?;
        tx.execute(
            "INSERT OR REPLACE INTO collections (name, dimensions, created_at) VALUES (?1, NULL, ?2)",
            params![name, Utc::now().to_rfc3339()],
        )?;

        tx.commit()?;
        debug!("Created collection {}", name);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_collection(&self, name: &str) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let deleted = tx.execute("DELETE FROM chunks WHERE collection = ?1", params![name])?;
        tx.execute("DELETE FROM collections WHERE name = ?1", params![name])?;

        tx.commit()?;
        info!("Deleted collection {} ({} chunks)", name, deleted);
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn replace_collection(&self, staging: &str, target: &str) -> Result<usize> {
        let conn = self.lock()?;
        Self::require_collection(&conn, staging)?;

        let tx = conn.unchecked_transaction()?;

        tx.execute("DELETE FROM chunks WHERE collection = ?1", params![target])?;
        tx.execute("DELETE FROM collections WHERE name = ?1", params![target])?;
        let moved = tx.execute(
            "UPDATE chunks SET collection = ?2 WHERE collection = ?1",
            params![staging, target],
        )?;
        tx.execute(
            "UPDATE collections SET name = ?2 WHERE name = ?1",
            params![staging, target],
        )?;

        tx.commit()?;
        info!("Swapped {} chunks from {} into {}", moved, staging, target);
        Ok(moved)
    }

    async fn collection_info(&self, name: &str) -> Result<Option<CollectionInfo>> {
        let conn = self.lock()?;

        let row = conn
            .query_row(
                "SELECT dimensions, created_at FROM collections WHERE name = ?1",
                params![name],
                |row| Ok((row.get::<_, Option<i64>>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        let Some((dimensions, created_at)) = row else {
            return Ok(None);
        };

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE collection = ?1",
            params![name],
            |row| row.get(0),
        )?;

        Ok(Some(CollectionInfo {
            name: name.to_string(),
            chunk_count: count as usize,
            dimensions: dimensions.map(|d| d as usize),
            created_at: Self::parse_timestamp(&created_at),
        }))
    }

    #[instrument(skip(self, chunk), fields(id = %chunk.id))]
    async fn upsert(&self, collection: &str, chunk: &StoredChunk) -> Result<()> {
        let conn = self.lock()?;

        let dims = Self::require_collection(&conn, collection)?;
        check_dimensions(collection, dims, chunk.embedding.len())?;

        let tx = conn.unchecked_transaction()?;
        if dims.is_none() {
            tx.execute(
                "UPDATE collections SET dimensions = ?2 WHERE name = ?1",
                params![collection, chunk.embedding.len() as i64],
            )?;
        }

        tx.execute(
            r#"
            INSERT OR REPLACE INTO chunks
            (collection, id, content, source, embedding, chunk_order, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                collection,
                chunk.id,
                chunk.text,
                chunk.source,
                Self::embedding_to_bytes(&chunk.embedding),
                chunk.order,
                chunk.indexed_at.to_rfc3339(),
            ],
        )?;
        tx.commit()?;

        debug!("Upserted chunk {}", chunk.id);
        Ok(())
    }

    #[instrument(skip(self, query_embedding))]
    async fn query(
        &self,
        collection: &str,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let conn = self.lock()?;

        let dims = Self::dimensions_of(&conn, collection)?.ok_or_else(|| {
            CasebookError::Retrieval(format!("Collection '{}' does not exist", collection))
        })?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, content, source, embedding, chunk_order, indexed_at
            FROM chunks
            WHERE collection = ?1
            "#,
        )?;

        let chunks = stmt
            .query_map(params![collection], |row| {
                let embedding_bytes: Vec<u8> = row.get(3)?;
                let indexed_at_str: String = row.get(5)?;

                Ok(StoredChunk {
                    id: row.get(0)?,
                    text: row.get(1)?,
                    source: row.get(2)?,
                    embedding: Self::bytes_to_embedding(&embedding_bytes),
                    order: row.get(4)?,
                    indexed_at: Self::parse_timestamp(&indexed_at_str),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let results = rank(query_embedding, chunks, dims, limit)?;
        debug!("Found {} matching chunks", results.len());
        Ok(results)
    }

    async fn ids(&self, collection: &str) -> Result<Vec<String>> {
        let conn = self.lock()?;

        let mut stmt =
            conn.prepare("SELECT id FROM chunks WHERE collection = ?1 ORDER BY chunk_order")?;
        let ids = stmt
            .query_map(params![collection], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(ids)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let conn = self.lock()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
