//! Vector index abstraction for knowledge chunks.
//!
//! Defines a trait for collection-scoped vector storage and retrieval.

use crate::embeddings::EmbeddingConfig;
use crate::types::KnowledgeChunk;
use chrono::{DateTime, Utc};
use docqa_core::AppResult;
use serde::{Deserialize, Serialize};

/// What a collection was embedded with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub embedding: EmbeddingConfig,
    pub created_at: DateTime<Utc>,
}

/// Trait for vector index backends.
///
/// Every operation is scoped to one collection; collections never see each
/// other's chunks.
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Atomically replace every chunk of a collection.
    ///
    /// Returns the number of chunks written.
    async fn replace_collection(
        &self,
        info: &CollectionInfo,
        chunks: Vec<KnowledgeChunk>,
    ) -> AppResult<usize>;

    /// Search for the top-k most similar chunks to the query embedding.
    ///
    /// Returns chunks ordered by descending similarity score; ties keep
    /// chunk position order.
    async fn search(
        &self,
        collection: &str,
        query_embedding: &[f32],
        top_k: usize,
    ) -> AppResult<Vec<(KnowledgeChunk, f32)>>;

    /// Number of chunks stored for a collection.
    async fn count(&self, collection: &str) -> AppResult<usize>;

    /// Embedding metadata recorded for a collection, if it exists.
    async fn collection_info(&self, collection: &str) -> AppResult<Option<CollectionInfo>>;

    /// Remove a collection and its chunks. Returns the number of chunks removed.
    async fn drop_collection(&self, collection: &str) -> AppResult<usize>;

    /// Remove every collection.
    async fn reset(&self) -> AppResult<()>;
}
