//! Ingestion collaborators: turn URLs, uploads, audio and videos into documents.

pub mod audio;
pub mod extract;
pub mod upload;
pub mod urls;
pub mod youtube;

pub use audio::transcribe_upload;
pub use upload::{load_path, load_upload, FileKind};
pub use urls::{fetch_urls, FetchedPage, HttpFetcher, PageFetcher};
pub use youtube::{fetch_youtube, AudioDownloader, DownloadedAudio, VideoInfo, YtDlpDownloader};
