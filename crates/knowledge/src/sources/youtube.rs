//! YouTube ingestion: download audio with yt-dlp, then transcribe it.

use crate::types::Document;
use docqa_core::{AppError, AppResult};
use docqa_llm::Transcriber;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Video metadata written by `yt-dlp --write-info-json`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub channel: Option<String>,

    #[serde(default)]
    pub uploader: Option<String>,

    /// Length in seconds
    #[serde(default)]
    pub duration: Option<f64>,

    #[serde(default)]
    pub description: Option<String>,
}

impl VideoInfo {
    fn author(&self) -> Option<&str> {
        self.channel.as_deref().or(self.uploader.as_deref())
    }
}

/// Audio extracted from a video, plus whatever metadata was available.
#[derive(Debug, Clone)]
pub struct DownloadedAudio {
    pub audio: PathBuf,
    pub info: VideoInfo,
}

/// Downloads the audio track of a video URL into a directory.
#[async_trait::async_trait]
pub trait AudioDownloader: Send + Sync {
    async fn download(&self, url: &str, dir: &Path) -> AppResult<DownloadedAudio>;
}

/// Runs the `yt-dlp` executable.
#[derive(Debug, Clone)]
pub struct YtDlpDownloader {
    program: String,
}

impl YtDlpDownloader {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for YtDlpDownloader {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

#[async_trait::async_trait]
impl AudioDownloader for YtDlpDownloader {
    #[tracing::instrument(skip(self, dir))]
    async fn download(&self, url: &str, dir: &Path) -> AppResult<DownloadedAudio> {
        require_web_url(url)?;

        let template = dir.join("%(title)s.%(ext)s");
        let output = Command::new(&self.program)
            .arg("-f")
            .arg("bestaudio/best")
            .arg("-x")
            .arg("--audio-format")
            .arg("mp3")
            .arg("--write-info-json")
            .arg("--no-playlist")
            .arg("-o")
            .arg(&template)
            .arg("--")
            .arg(url)
            .output()
            .await
            .map_err(|e| {
                AppError::Ingestion(format!("Failed to run {}: {}", self.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Ingestion(format!(
                "{} failed for {}: {}",
                self.program,
                url,
                stderr.trim()
            )));
        }

        collect_download(dir)
    }
}

/// Only absolute http(s) URLs reach the downloader's command line.
fn require_web_url(url: &str) -> AppResult<()> {
    match reqwest::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(AppError::Ingestion(format!("Not an http(s) video URL: {}", url))),
    }
}

/// Locate the extracted audio file and parse the info JSON next to it.
pub(crate) fn collect_download(dir: &Path) -> AppResult<DownloadedAudio> {
    let mut audio = None;
    let mut info = VideoInfo::default();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let name = path.to_string_lossy().to_lowercase();

        if name.ends_with(".info.json") {
            let raw = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<VideoInfo>(&raw) {
                Ok(parsed) => info = parsed,
                Err(e) => tracing::warn!("Ignoring unreadable video metadata: {}", e),
            }
        } else if name.ends_with(".mp3") {
            audio = Some(path);
        }
    }

    let audio = audio.ok_or_else(|| {
        AppError::Ingestion("Audio download produced no mp3 file".to_string())
    })?;

    Ok(DownloadedAudio { audio, info })
}

/// Download, transcribe and wrap a video's audio as a document.
///
/// All intermediate files live in a temporary directory removed on return.
pub async fn fetch_youtube(
    downloader: &dyn AudioDownloader,
    transcriber: &dyn Transcriber,
    url: &str,
) -> AppResult<Document> {
    let dir = tempfile::TempDir::new()?;

    tracing::info!("Downloading audio for {}", url);
    let downloaded = downloader.download(url, dir.path()).await?;

    tracing::info!("Transcribing {:?}", downloaded.audio.file_name().unwrap_or_default());
    let transcript = transcriber.transcribe(&downloaded.audio).await?;

    let info = downloaded.info;
    let mut document = Document::new(transcript, url);
    if let Some(title) = info.title.as_deref() {
        document = document.with_meta("title", title);
    }
    if let Some(author) = info.author() {
        document = document.with_meta("author", author);
    }
    if let Some(duration) = info.duration {
        document = document.with_meta("length_sec", (duration.round() as u64).to_string());
    }
    if let Some(description) = info.description.as_deref() {
        document = document.with_meta("description", description);
    }

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeDownloader;

    #[async_trait::async_trait]
    impl AudioDownloader for FakeDownloader {
        async fn download(&self, _url: &str, dir: &Path) -> AppResult<DownloadedAudio> {
            std::fs::write(dir.join("Intro to Rust.mp3"), b"audio")?;
            std::fs::write(
                dir.join("Intro to Rust.info.json"),
                r#"{"title":"Intro to Rust","channel":"Rustacean","duration":612.4,"description":"Ownership basics"}"#,
            )?;
            collect_download(dir)
        }
    }

    #[derive(Default)]
    struct PathTranscriber {
        seen: Mutex<Option<PathBuf>>,
    }

    #[async_trait::async_trait]
    impl Transcriber for PathTranscriber {
        async fn transcribe(&self, audio: &Path) -> AppResult<String> {
            *self.seen.lock().unwrap() = Some(audio.to_path_buf());
            Ok("ownership means one owner".to_string())
        }
    }

    #[tokio::test]
    async fn test_fetch_youtube_captures_metadata() {
        let transcriber = PathTranscriber::default();
        let doc = fetch_youtube(&FakeDownloader, &transcriber, "https://youtu.be/abc")
            .await
            .unwrap();

        assert_eq!(doc.content, "ownership means one owner");
        assert_eq!(doc.source(), "https://youtu.be/abc");
        assert_eq!(doc.metadata["title"], "Intro to Rust");
        assert_eq!(doc.metadata["author"], "Rustacean");
        assert_eq!(doc.metadata["length_sec"], "612");
        assert_eq!(doc.metadata["description"], "Ownership basics");

        let audio = transcriber.seen.lock().unwrap().clone().unwrap();
        assert!(!audio.exists());
    }

    #[test]
    fn test_collect_download_requires_audio() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join("x.info.json"), "{}").unwrap();
        assert!(matches!(collect_download(temp.path()), Err(AppError::Ingestion(_))));
    }

    #[test]
    fn test_author_falls_back_to_uploader() {
        let info: VideoInfo = serde_json::from_str(r#"{"uploader":"someone"}"#).unwrap();
        assert_eq!(info.author(), Some("someone"));
    }

    #[tokio::test]
    async fn test_missing_program_is_ingestion_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let downloader = YtDlpDownloader::new("docqa-no-such-binary");
        let result = downloader.download("https://youtu.be/abc", temp.path()).await;
        assert!(matches!(result, Err(AppError::Ingestion(_))));
    }

    #[tokio::test]
    async fn test_option_like_url_is_rejected() {
        let temp = tempfile::TempDir::new().unwrap();
        let downloader = YtDlpDownloader::default();
        let result = downloader
            .download("--exec=touch /tmp/owned", temp.path())
            .await;
        assert!(matches!(result, Err(AppError::Ingestion(_))));

        let result = downloader.download("file:///etc/passwd", temp.path()).await;
        assert!(matches!(result, Err(AppError::Ingestion(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_url_follows_end_of_options_marker() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::TempDir::new().unwrap();
        let log = temp.path().join("argv.log");
        let program = temp.path().join("fake-yt-dlp");
        std::fs::write(
            &program,
            format!(
                "#!/bin/sh\nfor arg in \"$@\"; do echo \"$arg\"; done > '{}'\nexit 1\n",
                log.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();

        let out = tempfile::TempDir::new().unwrap();
        let downloader = YtDlpDownloader::new(program.to_string_lossy());
        let result = downloader.download("https://youtu.be/abc", out.path()).await;
        assert!(matches!(result, Err(AppError::Ingestion(_))));

        let argv = std::fs::read_to_string(&log).unwrap();
        let args: Vec<&str> = argv.lines().collect();
        assert_eq!(args[args.len() - 2..], ["--", "https://youtu.be/abc"]);
    }
}
