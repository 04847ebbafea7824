//! Ingest command handler.
//!
//! Gathers documents from every source given on the command line and embeds
//! them together as one session collection, replacing what was there.

use crate::app::App;
use clap::Args;
use docqa_core::{config::AppConfig, AppError};
use docqa_knowledge::sources::{fetch_urls, fetch_youtube, load_path, load_upload, transcribe_upload};
use docqa_knowledge::{collection_name, Document};
use std::path::{Path, PathBuf};

/// Embed URLs, files, a directory, a YouTube video or audio
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Web pages to fetch
    #[arg(long)]
    pub url: Vec<String>,

    /// Files to extract (pdf, txt, docx, csv, xlsx)
    #[arg(long)]
    pub file: Vec<PathBuf>,

    /// Directory to walk for supported files
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// YouTube video to download and transcribe
    #[arg(long)]
    pub youtube: Option<String>,

    /// Audio file to transcribe
    #[arg(long)]
    pub audio: Option<PathBuf>,

    /// Session whose collection is replaced
    #[arg(short, long)]
    pub session: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing ingest command");
        tracing::debug!("Ingest command options: {:?}", self);

        let app = App::from_config(config)?;
        let documents = self.gather(&app).await?;

        if documents.is_empty() {
            return Err(AppError::Ingestion(
                "Nothing to ingest: pass --url, --file, --path, --youtube or --audio".to_string(),
            )
            .into());
        }

        let session = self.session.as_deref();
        let stats = app.knowledge.ingest(session, &documents).await?;

        if self.json {
            let output = serde_json::json!({
                "collection": collection_name(session),
                "documents": stats.documents,
                "chunks": stats.chunks,
                "chars": stats.chars,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Embedded {} documents ({} chunks, {} chars) into '{}'",
                stats.documents,
                stats.chunks,
                stats.chars,
                collection_name(session)
            );
        }

        Ok(())
    }

    async fn gather(&self, app: &App) -> anyhow::Result<Vec<Document>> {
        let mut documents = Vec::new();

        if !self.url.is_empty() {
            documents.extend(fetch_urls(app.fetcher.as_ref(), &self.url).await);
        }

        for file in &self.file {
            let bytes = tokio::fs::read(file).await?;
            documents.extend(load_upload(&file_name(file), &bytes)?);
        }

        if let Some(path) = &self.path {
            documents.extend(load_path(path)?);
        }

        if let Some(url) = &self.youtube {
            let document = fetch_youtube(app.downloader.as_ref(), app.transcriber()?, url).await?;
            documents.push(document);
        }

        if let Some(audio) = &self.audio {
            let bytes = tokio::fs::read(audio).await?;
            let document = transcribe_upload(app.transcriber()?, &file_name(audio), &bytes).await?;
            documents.push(document);
        }

        Ok(documents)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
