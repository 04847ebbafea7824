//! Knowledge system type definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata key every document and passage carries.
pub const SOURCE_KEY: &str = "source";

/// A unit of ingested text with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Extracted plain text
    pub content: String,

    /// Provenance (`source` always set; YouTube adds title, author, ...)
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    /// Create a document with the given source label.
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(SOURCE_KEY.to_string(), source.into());
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Attach an extra metadata entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn source(&self) -> &str {
        self.metadata
            .get(SOURCE_KEY)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// A retrieved chunk of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub content: String,
    pub metadata: BTreeMap<String, String>,

    /// Cosine similarity to the query
    #[serde(default)]
    pub score: f32,
}

impl Passage {
    pub fn source(&self) -> &str {
        self.metadata
            .get(SOURCE_KEY)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// A text chunk with embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    /// Content hash of collection, position and text
    pub id: String,

    /// Collection (session) the chunk belongs to
    pub collection: String,

    /// Position within the collection
    pub position: u32,

    /// Text content
    pub text: String,

    /// Embedding vector
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    /// Document metadata (includes `source`)
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl KnowledgeChunk {
    /// Convert into a passage carrying the similarity score.
    pub fn into_passage(self, score: f32) -> Passage {
        let metadata = match self.metadata {
            serde_json::Value::Object(map) => map
                .into_iter()
                .map(|(k, v)| match v {
                    serde_json::Value::String(s) => (k, s),
                    other => (k, other.to_string()),
                })
                .collect(),
            _ => BTreeMap::new(),
        };

        Passage {
            content: self.text,
            metadata,
            score,
        }
    }
}

/// Internal chunk candidate before embedding.
#[derive(Debug, Clone)]
pub struct ChunkCandidate {
    pub position: u32,
    pub text: String,
    pub metadata: BTreeMap<String, String>,
}

/// Statistics from an ingestion.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestStats {
    /// Number of documents embedded
    pub documents: usize,

    /// Number of chunks written to the index
    pub chunks: usize,

    /// Total characters of extracted text
    pub chars: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_source() {
        let doc = Document::new("text", "https://example.com").with_meta("title", "Example");
        assert_eq!(doc.source(), "https://example.com");
        assert_eq!(doc.metadata.get("title").map(String::as_str), Some("Example"));
    }

    #[test]
    fn test_chunk_into_passage_flattens_metadata() {
        let chunk = KnowledgeChunk {
            id: "c1".to_string(),
            collection: "default".to_string(),
            position: 0,
            text: "hello".to_string(),
            embedding: None,
            metadata: serde_json::json!({"source": "notes.txt", "length_sec": 42}),
        };

        let passage = chunk.into_passage(0.5);
        assert_eq!(passage.source(), "notes.txt");
        assert_eq!(passage.metadata.get("length_sec").map(String::as_str), Some("42"));
        assert_eq!(passage.score, 0.5);
    }

    #[test]
    fn test_missing_source_is_empty() {
        let passage = Passage {
            content: "x".to_string(),
            metadata: BTreeMap::new(),
            score: 0.0,
        };
        assert_eq!(passage.source(), "");
    }
}
