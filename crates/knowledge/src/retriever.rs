//! Retrieval capability bound to an answering engine.

use crate::embeddings::EmbeddingProvider;
use crate::types::Passage;
use crate::vector_index::VectorIndex;
use docqa_core::AppResult;
use std::sync::Arc;

/// Passages returned per query unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 4;

/// Anything that can turn a query into relevant passages.
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    /// Retrieve passages for `query`, most relevant first.
    async fn retrieve(&self, query: &str) -> AppResult<Vec<Passage>>;
}

/// Retriever over one collection of the vector index.
#[derive(Clone)]
pub struct VectorRetriever {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    collection: String,
    top_k: usize,
}

impl VectorRetriever {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            index,
            embedder,
            collection: collection.into(),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

impl std::fmt::Debug for VectorRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorRetriever")
            .field("collection", &self.collection)
            .field("embedder", &self.embedder.provider_name())
            .field("top_k", &self.top_k)
            .finish()
    }
}

#[async_trait::async_trait]
impl Retriever for VectorRetriever {
    #[tracing::instrument(skip(self), fields(collection = %self.collection))]
    async fn retrieve(&self, query: &str) -> AppResult<Vec<Passage>> {
        let query_embedding = self.embedder.embed_query(query).await?;
        let results = self
            .index
            .search(&self.collection, &query_embedding, self.top_k)
            .await?;

        if let Some((_, top)) = results.first() {
            tracing::debug!("Retrieved {} passages (top score: {:.3})", results.len(), top);
        }

        Ok(results
            .into_iter()
            .map(|(chunk, score)| chunk.into_passage(score))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::{create_provider, EmbeddingConfig};
    use crate::index::SqliteIndex;
    use crate::types::KnowledgeChunk;
    use crate::vector_index::CollectionInfo;
    use tempfile::TempDir;

    async fn seeded(temp: &TempDir, texts: &[&str]) -> VectorRetriever {
        let config = EmbeddingConfig::default();
        let embedder = create_provider(&config, None).unwrap();
        let index = Arc::new(SqliteIndex::open(temp.path().join("index.sqlite")).unwrap());

        let mut chunks = Vec::new();
        for (position, text) in texts.iter().enumerate() {
            chunks.push(KnowledgeChunk {
                id: format!("c{}", position),
                collection: "default".to_string(),
                position: position as u32,
                text: text.to_string(),
                embedding: Some(embedder.embed(text).await.unwrap()),
                metadata: serde_json::json!({"source": format!("doc{}.txt", position)}),
            });
        }

        let info = CollectionInfo {
            name: "default".to_string(),
            embedding: config,
            created_at: chrono::Utc::now(),
        };
        index.replace_collection(&info, chunks).await.unwrap();

        VectorRetriever::new(index, embedder, "default")
    }

    #[tokio::test]
    async fn test_retrieves_most_relevant_first() {
        let temp = TempDir::new().unwrap();
        let retriever = seeded(
            &temp,
            &[
                "Photosynthesis converts sunlight into chemical energy in plants.",
                "Paris is the capital city of France.",
                "The Rust borrow checker enforces memory safety.",
            ],
        )
        .await;

        let passages = retriever.retrieve("What is the capital of France?").await.unwrap();
        assert_eq!(passages.len(), 3);
        assert_eq!(passages[0].source(), "doc1.txt");
        assert!(passages[0].content.contains("Paris"));
    }

    #[tokio::test]
    async fn test_top_k_limits_results() {
        let temp = TempDir::new().unwrap();
        let retriever = seeded(&temp, &["one alpha", "two beta", "three gamma"])
            .await
            .with_top_k(2);

        let passages = retriever.retrieve("alpha").await.unwrap();
        assert_eq!(passages.len(), 2);
    }

    #[tokio::test]
    async fn test_retrieval_is_deterministic() {
        let temp = TempDir::new().unwrap();
        let retriever = seeded(&temp, &["rust ownership", "python typing", "go channels"]).await;

        let first = retriever.retrieve("ownership in rust").await.unwrap();
        let second = retriever.retrieve("ownership in rust").await.unwrap();
        assert_eq!(first, second);
    }
}
