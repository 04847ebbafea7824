//! Knowledge base configuration.

use crate::embeddings::EmbeddingConfig;
use docqa_core::config::KnowledgeSettings;
use docqa_core::AppConfig;
use std::path::PathBuf;

/// Collection used when a caller does not name a session.
pub const DEFAULT_COLLECTION: &str = "default";

/// Everything the corpus needs to chunk, embed, persist and retrieve.
#[derive(Debug, Clone)]
pub struct KnowledgeConfig {
    /// SQLite index location (`.docqa/index.sqlite`)
    pub index_path: PathBuf,

    /// Embedding provider settings
    pub embedding: EmbeddingConfig,

    /// API key for hosted embedding providers
    pub embedding_key: Option<String>,

    /// Target chunk size in characters
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks
    pub chunk_overlap: usize,

    /// Passages returned per query
    pub top_k: usize,
}

impl KnowledgeConfig {
    /// Derive the knowledge configuration from the application config.
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            index_path: config.index_path(),
            embedding: EmbeddingConfig::from(&config.embedding),
            embedding_key: config.resolve_embedding_key(),
            ..Self::with_settings(config.index_path(), config.knowledge)
        }
    }

    /// Offline configuration using trigram embeddings.
    pub fn with_settings(index_path: impl Into<PathBuf>, settings: KnowledgeSettings) -> Self {
        Self {
            index_path: index_path.into(),
            embedding: EmbeddingConfig::default(),
            embedding_key: None,
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
            top_k: settings.top_k,
        }
    }
}

/// Map a session id to its collection name. Empty ids use the default.
pub fn collection_name(session_id: Option<&str>) -> String {
    match session_id.map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => DEFAULT_COLLECTION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collection_name_defaults() {
        assert_eq!(collection_name(None), "default");
        assert_eq!(collection_name(Some("  ")), "default");
        assert_eq!(collection_name(Some("alice")), "alice");
    }

    #[test]
    fn test_from_app_uses_workspace_index() {
        let temp = TempDir::new().unwrap();
        let app = AppConfig {
            workspace: temp.path().to_path_buf(),
            ..Default::default()
        };

        let config = KnowledgeConfig::from_app(&app);
        assert_eq!(config.index_path, temp.path().join(".docqa").join("index.sqlite"));
        assert_eq!(config.embedding.provider, app.embedding.provider);
        assert_eq!(config.chunk_size, 700);
        assert_eq!(config.chunk_overlap, 100);
        assert_eq!(config.top_k, 4);
    }

    #[test]
    fn test_with_settings_is_offline() {
        let config = KnowledgeConfig::with_settings("/tmp/index.sqlite", KnowledgeSettings::default());
        assert_eq!(config.embedding.provider, "trigram");
        assert!(config.embedding_key.is_none());
    }
}
