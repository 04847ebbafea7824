//! SQLite-backed vector index for knowledge chunks.
//!
//! Brute-force cosine similarity over a `chunks` table. Each operation opens
//! its own connection on a blocking thread.

use crate::embeddings::EmbeddingConfig;
use crate::types::KnowledgeChunk;
use crate::vector_index::{CollectionInfo, VectorIndex};
use chrono::{DateTime, Utc};
use docqa_core::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// Initialize the SQLite index database.
pub fn init_index(db_path: &Path) -> AppResult<Connection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::Index(format!("Failed to create index directory: {}", e)))?;
    }

    let conn = Connection::open(db_path)
        .map_err(|e| AppError::Index(format!("Failed to open SQLite index: {}", e)))?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS collections (
            name TEXT PRIMARY KEY,
            provider TEXT NOT NULL,
            model TEXT NOT NULL,
            dimensions INTEGER NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS chunks (
            id TEXT NOT NULL,
            collection TEXT NOT NULL,
            position INTEGER NOT NULL,
            text TEXT NOT NULL,
            embedding BLOB NOT NULL,
            metadata TEXT,
            PRIMARY KEY (collection, id)
        );

        CREATE INDEX IF NOT EXISTS idx_chunks_collection ON chunks(collection);
        "#,
    )
    .map_err(|e| AppError::Index(format!("Failed to create tables: {}", e)))?;

    tracing::debug!("Initialized SQLite index at {:?}", db_path);
    Ok(conn)
}

/// Replace all chunks of a collection in one transaction.
pub fn replace_chunks(
    conn: &mut Connection,
    info: &CollectionInfo,
    chunks: &[KnowledgeChunk],
) -> AppResult<usize> {
    let tx = conn
        .transaction()
        .map_err(|e| AppError::Index(format!("Failed to begin transaction: {}", e)))?;

    tx.execute("DELETE FROM chunks WHERE collection = ?1", params![info.name])
        .map_err(|e| AppError::Index(format!("Failed to clear collection: {}", e)))?;

    {
        let mut stmt = tx
            .prepare(
                "INSERT OR REPLACE INTO chunks (id, collection, position, text, embedding, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .map_err(|e| AppError::Index(format!("Failed to prepare insert: {}", e)))?;

        for chunk in chunks {
            let embedding = chunk
                .embedding
                .as_ref()
                .ok_or_else(|| AppError::Index("Chunk missing embedding".to_string()))?;
            let metadata_json = serde_json::to_string(&chunk.metadata)?;

            stmt.execute(params![
                chunk.id,
                info.name,
                chunk.position as i64,
                chunk.text,
                embedding_to_bytes(embedding),
                metadata_json,
            ])
            .map_err(|e| AppError::Index(format!("Failed to insert chunk: {}", e)))?;
        }
    }

    tx.execute(
        "INSERT OR REPLACE INTO collections (name, provider, model, dimensions, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            info.name,
            info.embedding.provider,
            info.embedding.model,
            info.embedding.dimensions as i64,
            info.created_at.to_rfc3339(),
        ],
    )
    .map_err(|e| AppError::Index(format!("Failed to record collection: {}", e)))?;

    tx.commit()
        .map_err(|e| AppError::Index(format!("Failed to commit collection: {}", e)))?;

    Ok(chunks.len())
}

/// Query a collection for the top-k most similar chunks.
pub fn query_chunks(
    conn: &Connection,
    collection: &str,
    query_embedding: &[f32],
    top_k: usize,
) -> AppResult<Vec<(KnowledgeChunk, f32)>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, position, text, embedding, metadata FROM chunks
             WHERE collection = ?1",
        )
        .map_err(|e| AppError::Index(format!("Failed to prepare query: {}", e)))?;

    let rows = stmt
        .query_map(params![collection], |row| {
            let embedding_bytes: Vec<u8> = row.get(3)?;
            let metadata_json: Option<String> = row.get(4)?;
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                embedding_bytes,
                metadata_json,
            ))
        })
        .map_err(|e| AppError::Index(format!("Failed to query chunks: {}", e)))?;

    let mut results = Vec::new();
    for row in rows {
        let (id, position, text, embedding_bytes, metadata_json) =
            row.map_err(|e| AppError::Index(format!("Failed to read chunk: {}", e)))?;

        let embedding = match bytes_to_embedding(&embedding_bytes) {
            Ok(embedding) => embedding,
            Err(e) => {
                tracing::warn!("Skipping chunk {} with corrupt embedding: {}", id, e);
                continue;
            }
        };
        let metadata = metadata_json
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or(serde_json::Value::Null);

        let score = cosine_similarity(query_embedding, &embedding);
        results.push((
            KnowledgeChunk {
                id,
                collection: collection.to_string(),
                position: position as u32,
                text,
                embedding: Some(embedding),
                metadata,
            },
            score,
        ));
    }

    results.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.position.cmp(&b.0.position))
    });
    results.truncate(top_k);

    tracing::debug!(
        "Retrieved {} chunks from '{}' (requested top-{})",
        results.len(),
        collection,
        top_k
    );

    Ok(results)
}

/// Count chunks in a collection.
pub fn count_chunks(conn: &Connection, collection: &str) -> AppResult<usize> {
    conn.query_row(
        "SELECT COUNT(*) FROM chunks WHERE collection = ?1",
        params![collection],
        |row| row.get::<_, i64>(0),
    )
    .map(|count| count as usize)
    .map_err(|e| AppError::Index(format!("Failed to count chunks: {}", e)))
}

/// Load the recorded embedding settings of a collection.
pub fn get_collection(conn: &Connection, collection: &str) -> AppResult<Option<CollectionInfo>> {
    let row = conn
        .query_row(
            "SELECT provider, model, dimensions, created_at FROM collections WHERE name = ?1",
            params![collection],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()
        .map_err(|e| AppError::Index(format!("Failed to read collection: {}", e)))?;

    let Some((provider, model, dimensions, created_at)) = row else {
        return Ok(None);
    };

    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Index(format!("Invalid collection timestamp: {}", e)))?;

    Ok(Some(CollectionInfo {
        name: collection.to_string(),
        embedding: EmbeddingConfig {
            provider,
            model,
            dimensions: dimensions as usize,
            ..Default::default()
        },
        created_at,
    }))
}

/// Delete a collection. Returns the number of chunks removed.
pub fn delete_collection(conn: &Connection, collection: &str) -> AppResult<usize> {
    let removed = conn
        .execute("DELETE FROM chunks WHERE collection = ?1", params![collection])
        .map_err(|e| AppError::Index(format!("Failed to delete chunks: {}", e)))?;

    conn.execute("DELETE FROM collections WHERE name = ?1", params![collection])
        .map_err(|e| AppError::Index(format!("Failed to delete collection: {}", e)))?;

    Ok(removed)
}

/// Reset the index (delete all data).
pub fn reset_index(conn: &Connection) -> AppResult<()> {
    conn.execute_batch("DELETE FROM chunks; DELETE FROM collections;")
        .map_err(|e| AppError::Index(format!("Failed to reset index: {}", e)))?;

    tracing::info!("Reset vector index");
    Ok(())
}

/// Convert embedding vector to little-endian bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Index(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Calculate cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
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

/// File-backed SQLite vector index.
#[derive(Debug, Clone)]
pub struct SqliteIndex {
    path: PathBuf,
}

impl SqliteIndex {
    /// Open (creating if needed) the index at `path`.
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        init_index(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn with_conn<T, F>(&self, op: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> AppResult<T> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = init_index(&path)?;
            op(&mut conn)
        })
        .await
        .map_err(|e| AppError::Index(format!("Index task failed: {}", e)))?
    }
}

#[async_trait::async_trait]
impl VectorIndex for SqliteIndex {
    async fn replace_collection(
        &self,
        info: &CollectionInfo,
        chunks: Vec<KnowledgeChunk>,
    ) -> AppResult<usize> {
        let info = info.clone();
        self.with_conn(move |conn| replace_chunks(conn, &info, &chunks))
            .await
    }

    async fn search(
        &self,
        collection: &str,
        query_embedding: &[f32],
        top_k: usize,
    ) -> AppResult<Vec<(KnowledgeChunk, f32)>> {
        let collection = collection.to_string();
        let query = query_embedding.to_vec();
        self.with_conn(move |conn| query_chunks(conn, &collection, &query, top_k))
            .await
    }

    async fn count(&self, collection: &str) -> AppResult<usize> {
        let collection = collection.to_string();
        self.with_conn(move |conn| count_chunks(conn, &collection))
            .await
    }

    async fn collection_info(&self, collection: &str) -> AppResult<Option<CollectionInfo>> {
        let collection = collection.to_string();
        self.with_conn(move |conn| get_collection(conn, &collection))
            .await
    }

    async fn drop_collection(&self, collection: &str) -> AppResult<usize> {
        let collection = collection.to_string();
        self.with_conn(move |conn| delete_collection(conn, &collection))
            .await
    }

    async fn reset(&self) -> AppResult<()> {
        self.with_conn(|conn| reset_index(conn)).await
    }
}
