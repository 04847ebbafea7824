//! Uploaded file ingestion.

use crate::sources::extract;
use crate::types::Document;
use docqa_core::{AppError, AppResult};
use std::path::Path;
use walkdir::WalkDir;

/// File kinds accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Text,
    Docx,
    Csv,
    Spreadsheet,
}

impl FileKind {
    /// Classify a filename by extension (case-insensitive).
    pub fn from_filename(filename: &str) -> Option<Self> {
        match extension(filename).as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::Text),
            "docx" => Some(Self::Docx),
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" => Some(Self::Spreadsheet),
            _ => None,
        }
    }
}

fn extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}

/// Extract the text of an uploaded file.
///
/// Unknown extensions fail with `UnsupportedFormat` before the content is
/// read. Spreadsheets that cannot be parsed still produce a document whose
/// text describes the error.
pub fn load_upload(filename: &str, bytes: &[u8]) -> AppResult<Vec<Document>> {
    let kind = FileKind::from_filename(filename).ok_or_else(|| {
        let ext = extension(filename);
        if ext.is_empty() {
            AppError::UnsupportedFormat("Unsupported file type".to_string())
        } else {
            AppError::UnsupportedFormat(format!("Unsupported file type: .{}", ext))
        }
    })?;

    let text = match kind {
        FileKind::Pdf => extract::pdf_text(bytes)?,
        FileKind::Text => String::from_utf8(bytes.to_vec())
            .map_err(|e| AppError::Ingestion(format!("{} is not valid UTF-8: {}", filename, e)))?,
        FileKind::Docx => extract::docx_text(bytes)?,
        FileKind::Csv | FileKind::Spreadsheet => {
            let table = if kind == FileKind::Csv {
                extract::csv_table(bytes)
            } else if extension(filename) == "xls" {
                Err(AppError::Ingestion(
                    "legacy .xls workbooks are not supported, save as .xlsx".to_string(),
                ))
            } else {
                extract::xlsx_table(bytes)
            };
            table.unwrap_or_else(|e| format!("Error reading spreadsheet: {}", e))
        }
    };

    tracing::debug!("Extracted {} chars from {}", text.len(), filename);
    Ok(vec![Document::new(text, filename)])
}

/// Load a file or every supported file under a directory.
///
/// Files with unsupported extensions are skipped when walking a directory
/// but rejected when named directly.
pub fn load_path(path: &Path) -> AppResult<Vec<Document>> {
    if path.is_file() {
        return load_file(path);
    }

    if !path.is_dir() {
        return Err(AppError::Ingestion(format!("Path not found: {:?}", path)));
    }

    let mut documents = Vec::new();
    for entry in WalkDir::new(path)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let entry_path = entry.path();
        if !entry_path.is_file() {
            continue;
        }

        let name = entry_path.to_string_lossy();
        if FileKind::from_filename(&name).is_none() {
            tracing::debug!("Skipping unsupported file: {:?}", entry_path);
            continue;
        }

        match load_file(entry_path) {
            Ok(docs) => documents.extend(docs),
            Err(e) => tracing::warn!("Failed to load {:?}: {}", entry_path, e),
        }
    }

    Ok(documents)
}

fn load_file(path: &Path) -> AppResult<Vec<Document>> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());

    // Reject unknown types before reading the content.
    if FileKind::from_filename(&name).is_none() {
        return load_upload(&name, &[]);
    }

    let bytes = std::fs::read(path)?;
    load_upload(&name, &bytes)
}
