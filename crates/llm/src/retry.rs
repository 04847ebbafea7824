//! Bounded retry wrapper for language model clients.

use crate::client::{LlmClient, LlmRequest, LlmResponse};
use docqa_core::AppResult;
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, warn};

/// Initial backoff duration in milliseconds
const INITIAL_BACKOFF_MS: u64 = 100;

/// Upper bound on a single backoff interval
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Retries transient failures of the wrapped client with exponential backoff.
///
/// Only `AppError::Upstream` is retried. Refusals and local errors are
/// returned on the first attempt.
pub struct RetryingClient {
    inner: Arc<dyn LlmClient>,
    max_retries: u32,
    initial_backoff: Duration,
}

impl RetryingClient {
    pub fn new(inner: Arc<dyn LlmClient>, max_retries: u32) -> Self {
        Self {
            inner,
            max_retries,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        }
    }

    /// Override the first backoff interval (doubles on each retry).
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Wait before retry number `attempt + 1`, capped at `MAX_BACKOFF`.
    fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2_u32.saturating_pow(attempt))
            .min(MAX_BACKOFF)
    }
}

#[async_trait::async_trait]
impl LlmClient for RetryingClient {
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    #[instrument(skip(self, request), fields(provider = %self.inner.provider_name(), max_retries = self.max_retries))]
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let mut attempt = 0;

        loop {
            match self.inner.complete(request).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let backoff = self.backoff(attempt);
                    attempt += 1;
                    warn!(
                        "Completion failed (attempt {}/{}), retrying in {}ms: {}",
                        attempt,
                        self.max_retries + 1,
                        backoff.as_millis(),
                        e
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl std::fmt::Debug for RetryingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingClient")
            .field("provider", &self.inner.provider_name())
            .field("max_retries", &self.max_retries)
            .finish()
    }
}
