//! Corpus building: chunk, embed and persist documents per collection.

use crate::chunker::{chunk_documents, chunk_id};
use crate::config::KnowledgeConfig;
use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::index::SqliteIndex;
use crate::retriever::VectorRetriever;
use crate::types::{Document, IngestStats, KnowledgeChunk};
use crate::vector_index::{CollectionInfo, VectorIndex};
use chrono::Utc;
use docqa_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Instant;

/// Owns the vector index and embedding provider shared by every session.
#[derive(Clone)]
pub struct Corpus {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    chunk_size: usize,
    chunk_overlap: usize,
    top_k: usize,
    batch_size: usize,
}

impl Corpus {
    /// Open the SQLite index and embedding provider described by `config`.
    pub fn open_with(config: &KnowledgeConfig) -> AppResult<Self> {
        let index = Arc::new(SqliteIndex::open(&config.index_path)?);
        let embedder = create_provider(&config.embedding, config.embedding_key.as_deref())?;
        Ok(Self::with_parts(index, embedder, config))
    }

    /// Assemble a corpus from explicit parts.
    pub fn with_parts(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: &KnowledgeConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            top_k: config.top_k,
            batch_size: config.embedding.batch_size.max(1),
        }
    }

    /// Chunk, embed and store `documents` as the whole content of `collection`.
    ///
    /// Any chunks previously stored for the collection are replaced.
    pub async fn build(
        &self,
        collection: &str,
        documents: &[Document],
    ) -> AppResult<(VectorRetriever, IngestStats)> {
        let start = Instant::now();

        if documents.is_empty() {
            return Err(AppError::Ingestion(
                "No content could be extracted from the provided sources".to_string(),
            ));
        }

        let candidates = chunk_documents(documents, self.chunk_size, self.chunk_overlap)?;
        if candidates.is_empty() {
            return Err(AppError::Ingestion(
                "The provided sources contain no text".to_string(),
            ));
        }

        let mut chunks = Vec::with_capacity(candidates.len());
        for batch in candidates.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;

            if embeddings.len() != batch.len() {
                return Err(AppError::Upstream(format!(
                    "Embedding provider returned {} vectors for {} texts",
                    embeddings.len(),
                    batch.len()
                )));
            }

            for (candidate, embedding) in batch.iter().zip(embeddings) {
                chunks.push(KnowledgeChunk {
                    id: chunk_id(collection, candidate.position, &candidate.text),
                    collection: collection.to_string(),
                    position: candidate.position,
                    text: candidate.text.clone(),
                    embedding: Some(embedding),
                    metadata: serde_json::to_value(&candidate.metadata)?,
                });
            }
        }

        let info = CollectionInfo {
            name: collection.to_string(),
            embedding: self.embedder.describe(),
            created_at: Utc::now(),
        };
        let written = self.index.replace_collection(&info, chunks).await?;

        let stats = IngestStats {
            documents: documents.len(),
            chunks: written,
            chars: documents.iter().map(|d| d.content.chars().count()).sum(),
        };

        tracing::info!(
            "Embedded collection '{}': {} documents, {} chunks in {:.2}s",
            collection,
            stats.documents,
            stats.chunks,
            start.elapsed().as_secs_f64()
        );

        Ok((self.retriever(collection), stats))
    }

    /// Re-bind to a persisted collection, if it holds any chunks.
    pub async fn open(&self, collection: &str) -> AppResult<Option<VectorRetriever>> {
        if self.index.count(collection).await? == 0 {
            return Ok(None);
        }

        if let Some(info) = self.index.collection_info(collection).await? {
            info.embedding
                .validate_consistency(&self.embedder.describe())
                .map_err(|e| {
                    AppError::Config(format!(
                        "Collection '{}' was embedded with a different model ({}). Reset it and ingest again.",
                        collection, e
                    ))
                })?;
        }

        tracing::debug!("Re-bound persisted collection '{}'", collection);
        Ok(Some(self.retriever(collection)))
    }

    /// Remove every persisted vector of a collection.
    pub async fn clear(&self, collection: &str) -> AppResult<usize> {
        let removed = self.index.drop_collection(collection).await?;
        tracing::info!("Cleared collection '{}' ({} chunks)", collection, removed);
        Ok(removed)
    }

    /// Number of chunks stored for a collection.
    pub async fn count(&self, collection: &str) -> AppResult<usize> {
        self.index.count(collection).await
    }

    fn retriever(&self, collection: &str) -> VectorRetriever {
        VectorRetriever::new(self.index.clone(), self.embedder.clone(), collection)
            .with_top_k(self.top_k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retriever::Retriever;
    use docqa_core::config::KnowledgeSettings;
    use tempfile::TempDir;

    fn corpus(temp: &TempDir) -> Corpus {
        let config = KnowledgeConfig::with_settings(
            temp.path().join("index.sqlite"),
            KnowledgeSettings::default(),
        );
        Corpus::open_with(&config).unwrap()
    }

    fn docs() -> Vec<Document> {
        vec![
            Document::new("Paris is the capital city of France.", "https://example.com/france"),
            Document::new("Rust guarantees memory safety without garbage collection.", "rust.txt"),
        ]
    }

    #[tokio::test]
    async fn test_build_reports_stats() {
        let temp = TempDir::new().unwrap();
        let (retriever, stats) = corpus(&temp).build("default", &docs()).await.unwrap();

        assert_eq!(stats.documents, 2);
        assert_eq!(stats.chunks, 2);
        assert_eq!(retriever.collection(), "default");
    }

    #[tokio::test]
    async fn test_build_rejects_empty_input() {
        let temp = TempDir::new().unwrap();
        let corpus = corpus(&temp);

        assert!(matches!(corpus.build("default", &[]).await, Err(AppError::Ingestion(_))));
        let blank = vec![Document::new("   \n  ", "blank.txt")];
        assert!(matches!(corpus.build("default", &blank).await, Err(AppError::Ingestion(_))));
    }

    #[tokio::test]
    async fn test_open_rebinds_persisted_collection() {
        let temp = TempDir::new().unwrap();
        corpus(&temp).build("default", &docs()).await.unwrap();

        let reopened = corpus(&temp).open("default").await.unwrap().unwrap();
        let passages = reopened.retrieve("capital of France").await.unwrap();
        assert_eq!(passages[0].source(), "https://example.com/france");
    }

    #[tokio::test]
    async fn test_open_missing_collection() {
        let temp = TempDir::new().unwrap();
        assert!(corpus(&temp).open("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_open_detects_embedding_mismatch() {
        let temp = TempDir::new().unwrap();
        corpus(&temp).build("default", &docs()).await.unwrap();

        let mut config = KnowledgeConfig::with_settings(
            temp.path().join("index.sqlite"),
            KnowledgeSettings::default(),
        );
        config.embedding.dimensions = 128;
        let other = Corpus::open_with(&config).unwrap();

        assert!(matches!(other.open("default").await, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_clear_removes_vectors() {
        let temp = TempDir::new().unwrap();
        let corpus = corpus(&temp);
        corpus.build("default", &docs()).await.unwrap();
        corpus.build("other", &docs()).await.unwrap();

        assert_eq!(corpus.clear("default").await.unwrap(), 2);
        assert_eq!(corpus.count("default").await.unwrap(), 0);
        assert_eq!(corpus.count("other").await.unwrap(), 2);
        assert!(corpus.open("default").await.unwrap().is_none());
    }
}
