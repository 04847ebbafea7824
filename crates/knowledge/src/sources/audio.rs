//! Uploaded audio ingestion.

use crate::types::Document;
use docqa_core::{AppError, AppResult};
use docqa_llm::Transcriber;
use std::path::Path;

/// Transcribe an uploaded audio file into a single document.
///
/// The bytes are written to a temporary directory that is removed when
/// this returns, whether or not transcription succeeded.
pub async fn transcribe_upload(
    transcriber: &dyn Transcriber,
    filename: &str,
    bytes: &[u8],
) -> AppResult<Document> {
    if bytes.is_empty() {
        return Err(AppError::Ingestion(format!("{} is empty", filename)));
    }

    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join(safe_file_name(filename));
    tokio::fs::write(&path, bytes).await?;

    tracing::info!("Transcribing {} ({} bytes)", filename, bytes.len());
    let transcript = transcriber.transcribe(&path).await?;

    Ok(Document::new(transcript, filename))
}

/// Final path component of an uploaded name, never empty.
pub(crate) fn safe_file_name(filename: &str) -> String {
    Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "upload.bin".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTranscriber {
        seen: Mutex<Option<PathBuf>>,
    }

    #[async_trait::async_trait]
    impl Transcriber for RecordingTranscriber {
        async fn transcribe(&self, audio: &Path) -> AppResult<String> {
            let bytes = std::fs::read(audio)?;
            *self.seen.lock().unwrap() = Some(audio.to_path_buf());
            Ok(format!("{} bytes of speech", bytes.len()))
        }
    }

    #[tokio::test]
    async fn test_transcript_becomes_document() {
        let transcriber = RecordingTranscriber::default();
        let doc = transcribe_upload(&transcriber, "talk.mp3", b"ID3audio")
            .await
            .unwrap();

        assert_eq!(doc.content, "8 bytes of speech");
        assert_eq!(doc.source(), "talk.mp3");

        let seen = transcriber.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.file_name().unwrap(), "talk.mp3");
        assert!(!seen.exists());
    }

    #[tokio::test]
    async fn test_empty_audio_rejected() {
        let transcriber = RecordingTranscriber::default();
        let result = transcribe_upload(&transcriber, "silence.wav", b"").await;
        assert!(matches!(result, Err(AppError::Ingestion(_))));
    }

    #[test]
    fn test_safe_file_name() {
        assert_eq!(safe_file_name("../../etc/passwd"), "passwd");
        assert_eq!(safe_file_name("clip.m4a"), "clip.m4a");
        assert_eq!(safe_file_name(""), "upload.bin");
    }
}
