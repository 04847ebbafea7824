//! Document chunking with configurable size and overlap.

use crate::types::{ChunkCandidate, Document};
use docqa_core::{AppError, AppResult};
use sha2::{Digest, Sha256};
use text_splitter::{ChunkConfig, TextSplitter};

/// Split documents into overlapping character-bounded chunks.
///
/// Chunks prefer semantic boundaries (paragraphs, sentences, words) and
/// carry their document's metadata. Positions run across all documents in
/// input order, so the output is stable for the same input.
pub fn chunk_documents(
    documents: &[Document],
    chunk_size: usize,
    overlap: usize,
) -> AppResult<Vec<ChunkCandidate>> {
    let config = ChunkConfig::new(chunk_size)
        .with_overlap(overlap)
        .map_err(|e| AppError::Config(format!("Invalid chunk configuration: {}", e)))?;
    let splitter = TextSplitter::new(config);

    let mut candidates = Vec::new();
    for document in documents {
        for text in splitter.chunks(&document.content) {
            if text.trim().is_empty() {
                continue;
            }
            candidates.push(ChunkCandidate {
                position: candidates.len() as u32,
                text: text.to_string(),
                metadata: document.metadata.clone(),
            });
        }
    }

    tracing::debug!(
        "Chunked {} documents into {} chunks (size: {}, overlap: {})",
        documents.len(),
        candidates.len(),
        chunk_size,
        overlap
    );

    Ok(candidates)
}

/// Stable chunk identifier: SHA-256 of collection, position and text.
pub fn chunk_id(collection: &str, position: u32, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(collection.as_bytes());
    hasher.update(position.to_le_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
