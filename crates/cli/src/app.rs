//! Shared wiring for the server and the terminal commands.

use docqa_core::{AppConfig, AppError, AppResult};
use docqa_knowledge::sources::{AudioDownloader, HttpFetcher, PageFetcher, YtDlpDownloader};
use docqa_knowledge::KnowledgeBase;
use docqa_llm::{GroqTranscriber, Transcriber};
use std::sync::Arc;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// The knowledge base plus the collaborators ingestion needs.
pub struct App {
    pub knowledge: KnowledgeBase,
    pub fetcher: Arc<dyn PageFetcher>,
    pub downloader: Arc<dyn AudioDownloader>,
    transcriber: Option<Arc<dyn Transcriber>>,
}

impl App {
    pub fn new(
        knowledge: KnowledgeBase,
        fetcher: Arc<dyn PageFetcher>,
        downloader: Arc<dyn AudioDownloader>,
        transcriber: Option<Arc<dyn Transcriber>>,
    ) -> Self {
        Self {
            knowledge,
            fetcher,
            downloader,
            transcriber,
        }
    }

    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let knowledge = KnowledgeBase::from_config(config)?;
        let fetcher = Arc::new(HttpFetcher::new(FETCH_TIMEOUT)?);
        let downloader = Arc::new(YtDlpDownloader::new(config.transcription.yt_dlp.clone()));

        Ok(Self::new(
            knowledge,
            fetcher,
            downloader,
            transcriber_from_config(config)?,
        ))
    }

    /// The speech-to-text client, or a configuration error when no key is set.
    pub fn transcriber(&self) -> AppResult<&dyn Transcriber> {
        self.transcriber.as_deref().ok_or_else(|| {
            AppError::Config(
                "Transcription requires an API key (set GROQ_API_KEY or transcription.apiKeyEnv)"
                    .to_string(),
            )
        })
    }
}

fn transcriber_from_config(config: &AppConfig) -> AppResult<Option<Arc<dyn Transcriber>>> {
    let settings = &config.transcription;
    let Some(key) = config.resolve_transcription_key() else {
        tracing::warn!(
            "{} is not set; audio and YouTube ingestion are disabled",
            settings.api_key_env
        );
        return Ok(None);
    };

    let mut transcriber = GroqTranscriber::new(key)?
        .with_model(settings.model.clone())
        .with_language(settings.language.clone());
    if let Some(endpoint) = &settings.endpoint {
        transcriber = transcriber.with_base_url(endpoint.clone());
    }

    Ok(Some(Arc::new(transcriber)))
}
