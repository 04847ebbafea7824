//! Speech-to-text collaborator.
//!
//! Audio never reaches the answering engine directly; it is transcribed to
//! text first and ingested like any other document.

use crate::providers::status_error;
use crate::types::ProviderType;
use docqa_core::{AppError, AppResult};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

/// Default Whisper model served by Groq.
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-large-v3-turbo";

/// Guidance sent with every transcription request.
pub const TRANSCRIPTION_PROMPT: &str = "Transcribe the audio file. Don't make up new things";

/// Audio uploads can be large; give them longer than chat requests.
const TRANSCRIPTION_TIMEOUT_SECS: u64 = 300;

/// Turns an audio file into plain text.
#[async_trait::async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> AppResult<String>;
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Whisper transcription through Groq's OpenAI-compatible audio API.
#[derive(Debug, Clone)]
pub struct GroqTranscriber {
    base_url: String,
    api_key: String,
    model: String,
    language: String,
    client: reqwest::Client,
}

impl GroqTranscriber {
    pub fn new(api_key: impl Into<String>) -> AppResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AppError::Config(
                "Transcription requires a Groq API key".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TRANSCRIPTION_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: ProviderType::Groq.default_endpoint().to_string(),
            api_key,
            model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
            language: "en".to_string(),
            client,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn form(&self, file_name: String, bytes: Vec<u8>) -> Form {
        Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name))
            .text("model", self.model.clone())
            .text("prompt", TRANSCRIPTION_PROMPT)
            .text("response_format", "json")
            .text("language", self.language.clone())
            .text("temperature", "0")
    }
}

#[async_trait::async_trait]
impl Transcriber for GroqTranscriber {
    #[instrument(skip(self), fields(model = %self.model, language = %self.language))]
    async fn transcribe(&self, audio: &Path) -> AppResult<String> {
        let bytes = tokio::fs::read(audio).await?;
        let file_name = audio
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.mp3".to_string());

        info!(file = %file_name, bytes = bytes.len(), "Uploading audio for transcription");

        let url = format!("{}/audio/transcriptions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(self.form(file_name, bytes))
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to send audio to Groq: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(status_error("Groq transcription", status, &error_text));
        }

        let body: TranscriptionResponse = response.json().await.map_err(|e| {
            AppError::Upstream(format!("Failed to parse transcription response: {}", e))
        })?;

        info!(chars = body.text.len(), "Transcription complete");
        Ok(body.text)
    }
}
