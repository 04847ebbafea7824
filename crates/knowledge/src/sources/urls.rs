//! Web page ingestion.

use crate::sources::extract;
use crate::types::Document;
use docqa_core::{AppError, AppResult};
use std::time::Duration;

/// Raw response of a page fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchedPage {
    /// `Content-Type` header, empty when absent
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Fetches a URL's raw bytes.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> AppResult<FetchedPage>;
}

/// reqwest-backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("docqa/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpFetcher {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, url: &str) -> AppResult<FetchedPage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Ingestion(format!("Failed to fetch {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Ingestion(format!(
                "Failed to fetch {}: HTTP {}",
                url, status
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::Ingestion(format!("Failed to read {}: {}", url, e)))?;

        Ok(FetchedPage {
            content_type,
            body: body.to_vec(),
        })
    }
}

/// Fetch every URL and extract its text, skipping the ones that fail.
///
/// Returned documents keep the input order; `source` is the URL.
pub async fn fetch_urls(fetcher: &dyn PageFetcher, urls: &[String]) -> Vec<Document> {
    let mut documents = Vec::with_capacity(urls.len());

    for url in urls {
        let url = url.trim();
        if url.is_empty() {
            continue;
        }

        match fetch_one(fetcher, url).await {
            Ok(document) => documents.push(document),
            Err(e) => tracing::warn!("Failed to process URL {}: {}", url, e),
        }
    }

    tracing::info!("Loaded {} of {} URLs", documents.len(), urls.len());
    documents
}

async fn fetch_one(fetcher: &dyn PageFetcher, url: &str) -> AppResult<Document> {
    let page = fetcher.fetch(url).await?;
    let content_type = page.content_type.to_lowercase();
    let path = url.to_lowercase();

    let text = if content_type.contains("application/pdf") || path.ends_with(".pdf") {
        extract::pdf_text(&page.body)?
    } else if content_type.contains("text/plain") || path.ends_with(".txt") {
        extract::plain_text(&page.body)
    } else {
        extract::html_to_text(&extract::plain_text(&page.body))
    };

    tracing::debug!("Extracted {} chars from {}", text.len(), url);
    Ok(Document::new(text, url))
}
