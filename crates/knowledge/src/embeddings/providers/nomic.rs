//! Nomic Atlas embedding provider.
//!
//! API: https://docs.nomic.ai/reference/endpoints/nomic-embed-text

use super::retry_transient;
use crate::embeddings::{EmbeddingConfig, EmbeddingProvider};
use docqa_core::{AppError, AppResult};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_NOMIC_URL: &str = "https://api-atlas.nomic.ai/v1";

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Which side of an asymmetric retrieval pair a text is on.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
enum TaskType {
    SearchDocument,
    SearchQuery,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    texts: &'a [String],
    task_type: TaskType,
    dimensionality: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Hosted `nomic-embed-text` embeddings.
#[derive(Debug, Clone)]
pub struct NomicProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
    batch_size: usize,
}

impl NomicProvider {
    pub fn new(config: &EmbeddingConfig, api_key: &str) -> AppResult<Self> {
        if api_key.trim().is_empty() {
            return Err(AppError::Config("Nomic API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client for Nomic: {}", e)))?;

        Ok(Self {
            client,
            base_url: config
                .endpoint
                .as_deref()
                .unwrap_or(DEFAULT_NOMIC_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            dimensions: config.dimensions,
            batch_size: config.batch_size.max(1),
        })
    }

    fn request<'a>(&'a self, texts: &'a [String], task_type: TaskType) -> EmbeddingRequest<'a> {
        EmbeddingRequest {
            model: &self.model,
            texts,
            task_type,
            dimensionality: self.dimensions,
        }
    }

    #[instrument(skip(self, texts), fields(count = texts.len(), task = ?task_type))]
    async fn embed_once(&self, texts: &[String], task_type: TaskType) -> AppResult<Vec<Vec<f32>>> {
        let url = format!("{}/embedding/text", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request(texts, task_type))
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to send request to Nomic: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = format!("Nomic API error ({}): {}", status, error_text);
            return Err(if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                AppError::Upstream(message)
            } else {
                AppError::UpstreamRejected(message)
            });
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse Nomic response: {}", e)))?;

        if body.embeddings.len() != texts.len() {
            return Err(AppError::Upstream(format!(
                "Nomic returned {} embeddings for {} texts",
                body.embeddings.len(),
                texts.len()
            )));
        }

        Ok(body.embeddings)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for NomicProvider {
    fn provider_name(&self) -> &str {
        "nomic"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            debug!("Embedding batch of {} texts with Nomic", batch.len());
            let vectors =
                retry_transient("nomic", || self.embed_once(batch, TaskType::SearchDocument))
                    .await?;
            embeddings.extend(vectors);
        }
        Ok(embeddings)
    }

    async fn embed_query(&self, query: &str) -> AppResult<Vec<f32>> {
        let texts = [query.to_string()];
        let mut vectors =
            retry_transient("nomic", || self.embed_once(&texts, TaskType::SearchQuery)).await?;
        vectors
            .pop()
            .ok_or_else(|| AppError::Upstream("No embedding returned".to_string()))
    }
}
