//! LLM provider implementations.

pub mod groq;
pub mod ollama;

pub use groq::GroqClient;
pub use ollama::OllamaClient;

use docqa_core::AppError;
use reqwest::StatusCode;

/// Map a non-success HTTP status to the matching upstream error.
///
/// Rate limits and server errors are retryable; everything else is a refusal.
pub(crate) fn status_error(service: &str, status: StatusCode, body: &str) -> AppError {
    let message = format!("{} API error ({}): {}", service, status, body);
    if status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
    {
        AppError::Upstream(message)
    } else {
        AppError::UpstreamRejected(message)
    }
}
