//! Concrete embedding providers.

pub mod nomic;
pub mod ollama;
pub mod trigram;

pub use nomic::NomicProvider;
pub use ollama::OllamaProvider;
pub use trigram::TrigramProvider;

use docqa_core::AppResult;
use std::future::Future;
use std::time::Duration;

/// Maximum attempts for a remote embedding request
const MAX_ATTEMPTS: u32 = 3;

/// Initial backoff duration in milliseconds
const INITIAL_BACKOFF_MS: u64 = 100;

/// Run `op`, retrying transient upstream failures with exponential backoff.
pub(crate) async fn retry_transient<T, F, Fut>(provider: &str, mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt + 1 < MAX_ATTEMPTS => {
                attempt += 1;
                let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt);
                tracing::warn!(
                    "{} embedding failed (attempt {}/{}), retrying in {}ms: {}",
                    provider,
                    attempt,
                    MAX_ATTEMPTS,
                    backoff_ms,
                    e
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
            Err(e) => return Err(e),
        }
    }
}
