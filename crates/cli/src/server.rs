//! HTTP API.
//!
//! | Method | Path              | Body                                   |
//! |--------|-------------------|----------------------------------------|
//! | POST   | `/process-urls/`  | `{urls, session_id?}`                  |
//! | POST   | `/process-yt/`    | `{yt_url, session_id?}`                |
//! | POST   | `/process-audio/` | multipart `file`, `session_id`         |
//! | POST   | `/process-file/`  | multipart `file`, `session_id`         |
//! | POST   | `/ask/`           | `{question, chat_history?, session_id?}` |
//! | POST   | `/reset/`         | optional `{session_id?}`               |
//! | GET    | `/health`         |                                        |
//!
//! Ingestion and reset answer `{status, message}`; `/ask/` answers `{answer}`.
//! Every failure is `{status: "error", message}` with a matching status code.

use crate::app::App;
use anyhow::Context;
use axum::{
    body::Bytes,
    extract::multipart::MultipartRejection,
    extract::rejection::JsonRejection,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use docqa_core::AppError;
use docqa_knowledge::sources::{fetch_urls, fetch_youtube, load_upload, transcribe_upload};
use docqa_knowledge::IngestStats;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Uploads above this size are rejected before reaching a handler.
const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

type SharedApp = Arc<App>;

pub fn router(app: SharedApp) -> Router {
    Router::new()
        .route("/process-urls/", post(handle_process_urls))
        .route("/process-yt/", post(handle_process_youtube))
        .route("/process-audio/", post(handle_process_audio))
        .route("/process-file/", post(handle_process_file))
        .route("/ask/", post(handle_ask))
        .route("/reset/", post(handle_reset))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

/// Bind and serve until the process is stopped.
pub async fn run_server(app: SharedApp, bind_addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Listening on http://{}", bind_addr);
    axum::serve(listener, router(app)).await?;

    Ok(())
}

// ============ Responses ============

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
    message: String,
}

impl StatusResponse {
    fn success(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            status: "success",
            message: message.into(),
        })
    }
}

#[derive(Debug, Serialize)]
struct AnswerResponse {
    answer: String,
}

/// Error that renders as `{status: "error", message}`.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let status = match &err {
            AppError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::Ingestion(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotReady => StatusCode::CONFLICT,
            e if e.is_upstream() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", err);
        } else {
            tracing::warn!("Request rejected: {}", err);
        }

        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = StatusResponse {
            status: "error",
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Unwrap a JSON body, turning axum's rejection into the error envelope.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

fn log_stats(route: &str, stats: &IngestStats) {
    tracing::info!(
        "{}: embedded {} documents as {} chunks ({} chars)",
        route,
        stats.documents,
        stats.chunks,
        stats.chars
    );
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============ POST /process-urls/ ============

#[derive(Debug, Deserialize)]
struct UrlRequest {
    urls: Vec<String>,
    #[serde(default)]
    session_id: Option<String>,
}

async fn handle_process_urls(
    State(app): State<SharedApp>,
    payload: Result<Json<UrlRequest>, JsonRejection>,
) -> ApiResult<Json<StatusResponse>> {
    let request = json_body(payload)?;
    if request.urls.iter().all(|url| url.trim().is_empty()) {
        return Err(ApiError::bad_request("No URLs provided"));
    }

    let documents = fetch_urls(app.fetcher.as_ref(), &request.urls).await;
    let stats = app
        .knowledge
        .ingest(request.session_id.as_deref(), &documents)
        .await?;
    log_stats("process-urls", &stats);

    Ok(StatusResponse::success("URLs Processed & Embedded"))
}

// ============ POST /process-yt/ ============

#[derive(Debug, Deserialize)]
struct YoutubeRequest {
    yt_url: String,
    #[serde(default)]
    session_id: Option<String>,
}

async fn handle_process_youtube(
    State(app): State<SharedApp>,
    payload: Result<Json<YoutubeRequest>, JsonRejection>,
) -> ApiResult<Json<StatusResponse>> {
    let request = json_body(payload)?;
    if request.yt_url.trim().is_empty() {
        return Err(ApiError::bad_request("No YouTube URL provided"));
    }

    let transcriber = app.transcriber()?;
    let document =
        fetch_youtube(app.downloader.as_ref(), transcriber, request.yt_url.trim()).await?;
    let stats = app
        .knowledge
        .ingest(request.session_id.as_deref(), &[document])
        .await?;
    log_stats("process-yt", &stats);

    Ok(StatusResponse::success("YT URL Processed & Embedded"))
}

// ============ Multipart uploads ============

#[derive(Debug)]
struct Upload {
    filename: String,
    bytes: Vec<u8>,
    session_id: Option<String>,
}

async fn read_upload(multipart: Result<Multipart, MultipartRejection>) -> ApiResult<Upload> {
    let mut multipart =
        multipart.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let mut file = None;
    let mut session_id = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(e.body_text()))?;
                file = Some((filename, bytes.to_vec()));
            }
            Some("session_id") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(e.body_text()))?;
                session_id = Some(value);
            }
            other => tracing::debug!("Ignoring multipart field {:?}", other),
        }
    }

    let (filename, bytes) = file.ok_or_else(|| ApiError::bad_request("Missing file field"))?;
    Ok(Upload {
        filename,
        bytes,
        session_id,
    })
}

// ============ POST /process-audio/ ============

async fn handle_process_audio(
    State(app): State<SharedApp>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<StatusResponse>> {
    let upload = read_upload(multipart).await?;
    let transcriber = app.transcriber()?;

    let document = transcribe_upload(transcriber, &upload.filename, &upload.bytes).await?;
    let stats = app
        .knowledge
        .ingest(upload.session_id.as_deref(), &[document])
        .await?;
    log_stats("process-audio", &stats);

    Ok(StatusResponse::success("Audio Processed & Embedded"))
}

// ============ POST /process-file/ ============

async fn handle_process_file(
    State(app): State<SharedApp>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<StatusResponse>> {
    let upload = read_upload(multipart).await?;

    let documents = load_upload(&upload.filename, &upload.bytes)?;
    let stats = app
        .knowledge
        .ingest(upload.session_id.as_deref(), &documents)
        .await?;
    log_stats("process-file", &stats);

    Ok(StatusResponse::success("Uploaded file processed and embedded."))
}

// ============ POST /ask/ ============

#[derive(Debug, Deserialize)]
struct QueryRequest {
    question: String,
    #[serde(default)]
    chat_history: Option<Vec<String>>,
    #[serde(default)]
    session_id: Option<String>,
}

async fn handle_ask(
    State(app): State<SharedApp>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> ApiResult<Json<AnswerResponse>> {
    let request = json_body(payload)?;
    if let Some(history) = &request.chat_history {
        tracing::debug!("Ignoring chat_history with {} entries", history.len());
    }

    match app
        .knowledge
        .ask(request.session_id.as_deref(), &request.question)
        .await
    {
        Ok(answer) => Ok(Json(AnswerResponse { answer })),
        Err(AppError::NotReady) => Ok(Json(AnswerResponse {
            answer: AppError::NotReady.to_string(),
        })),
        Err(e) => Err(e.into()),
    }
}

// ============ POST /reset/ ============

#[derive(Debug, Default, Deserialize)]
struct ResetRequest {
    #[serde(default)]
    session_id: Option<String>,
}

async fn handle_reset(
    State(app): State<SharedApp>,
    body: Bytes,
) -> ApiResult<Json<StatusResponse>> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ResetRequest::default()
    } else {
        serde_json::from_slice::<ResetRequest>(&body)
            .map_err(|e| ApiError::bad_request(format!("Invalid reset body: {}", e)))?
    };

    let removed = app.knowledge.reset(request.session_id.as_deref()).await?;
    tracing::info!("Reset removed {} chunks", removed);

    Ok(StatusResponse::success(
        "Reset successful. QA engine reloaded. Please reprocess articles.",
    ))
}
