//! Error types for docqa.
//!
//! This module defines a unified error enum covering the answering engine,
//! ingestion, upstream services (retrieval, embedding, language model,
//! transcription) and the ambient configuration/I/O failures.

use thiserror::Error;

/// Unified error type for docqa.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// A question was asked before any corpus was ingested and no
    /// fallback offer is pending.
    #[error("No documents have been processed yet. Please ingest URLs, a file, or audio first.")]
    NotReady,

    /// A single ingestion item (URL, file, audio track) could not be
    /// fetched or parsed
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// The uploaded file has an extension no extractor handles
    #[error("{0}")]
    UnsupportedFormat(String),

    /// Retrieval, embedding, language model, or transcription service failure
    /// that may succeed on retry (network, rate limit, 5xx)
    #[error("Upstream service error: {0}")]
    Upstream(String),

    /// An upstream service refused the request (bad key, bad payload)
    #[error("Upstream service rejected the request: {0}")]
    UpstreamRejected(String),

    /// Vector index (SQLite) errors
    #[error("Index error: {0}")]
    Index(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether the failure came from an external service.
    pub fn is_upstream(&self) -> bool {
        matches!(self, AppError::Upstream(_) | AppError::UpstreamRejected(_))
    }

    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Upstream(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
