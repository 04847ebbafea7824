//! Knowledge base and answering engine.
//!
//! Ingests documents into a local SQLite vector index, one collection per
//! session, and answers questions over them with retrieval-augmented
//! generation.

pub mod chunker;
pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod index;
pub mod rag;
pub mod retriever;
pub mod sources;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use config::{collection_name, KnowledgeConfig, DEFAULT_COLLECTION};
pub use corpus::Corpus;
pub use rag::{AnsweringEngine, EngineSettings, NegotiationState, SessionRegistry};
pub use retriever::{Retriever, VectorRetriever};
pub use types::{Document, IngestStats, KnowledgeChunk, Passage};

use docqa_core::{AppConfig, AppResult};
use std::sync::Arc;

/// Sessions and their persisted collections.
///
/// Each session id owns one answering engine and one collection of the
/// vector index with the same name.
pub struct KnowledgeBase {
    corpus: Corpus,
    sessions: SessionRegistry,
}

impl KnowledgeBase {
    pub fn new(corpus: Corpus, sessions: SessionRegistry) -> Self {
        Self { corpus, sessions }
    }

    /// Wire the language model, prompt, embedding provider and index from config.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        config.ensure_docqa_dir()?;

        let llm = docqa_llm::create_client_from_config(config)?;
        let settings = EngineSettings::from_config(config)?;
        let corpus = Corpus::open_with(&KnowledgeConfig::from_app(config))?;

        tracing::info!(
            "Knowledge base ready (provider: {}, model: {}, embeddings: {})",
            config.provider,
            config.model,
            config.embedding.provider
        );

        Ok(Self::new(corpus, SessionRegistry::new(llm, settings)))
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Engine for a session. A new session is bound to its persisted
    /// collection when one exists.
    pub async fn session(&self, session_id: Option<&str>) -> Arc<AnsweringEngine> {
        let (engine, created) = self.sessions.get_or_create(session_id).await;
        if created {
            let collection = collection_name(session_id);
            match self.corpus.open(&collection).await {
                Ok(Some(retriever)) => engine.ingest(Arc::new(retriever)).await,
                Ok(None) => {}
                Err(e) => tracing::warn!("Could not re-open collection '{}': {}", collection, e),
            }
        }
        engine
    }

    /// Embed `documents` as the session's collection and rebind its engine.
    pub async fn ingest(
        &self,
        session_id: Option<&str>,
        documents: &[Document],
    ) -> AppResult<IngestStats> {
        let collection = collection_name(session_id);
        let engine = self.session(session_id).await;

        let (retriever, stats) = self.corpus.build(&collection, documents).await?;
        engine.ingest(Arc::new(retriever)).await;
        Ok(stats)
    }

    /// Answer a question in a session.
    pub async fn ask(&self, session_id: Option<&str>, question: &str) -> AppResult<String> {
        self.session(session_id).await.answer(question).await
    }

    /// Drop the session's vectors and start it over.
    pub async fn reset(&self, session_id: Option<&str>) -> AppResult<usize> {
        let removed = self.corpus.clear(&collection_name(session_id)).await?;
        self.sessions.reset(session_id).await;
        Ok(removed)
    }
}

impl std::fmt::Debug for KnowledgeBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBase")
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}
