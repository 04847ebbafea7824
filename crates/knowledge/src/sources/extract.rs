//! Plain-text extraction for uploaded and fetched content.
//!
//! Every extractor takes raw bytes and returns UTF-8 text; failures are
//! reported as `AppError::Ingestion` so callers can skip the item.

use docqa_core::{AppError, AppResult};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::io::{Cursor, Read};
use std::sync::LazyLock;

/// Maximum decompressed bytes read from a single ZIP entry.
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Maximum cells read from a worksheet.
const XLSX_MAX_CELLS: usize = 100_000;

type Archive<'a> = zip::ZipArchive<Cursor<&'a [u8]>>;

/// Extract the text of every page of a PDF.
pub fn pdf_text(bytes: &[u8]) -> AppResult<String> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| AppError::Ingestion(format!("PDF extraction failed: {}", e)))
}

/// Decode bytes as UTF-8, replacing invalid sequences.
pub fn plain_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("script pattern"));
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("style pattern"));
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern"));
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<[^>]+>").expect("tag pattern"));

/// Visible text of an HTML page: scripts and styles removed, whitespace collapsed.
pub fn html_to_text(html: &str) -> String {
    let mut text = html.to_string();
    for re in [&SCRIPT_RE, &STYLE_RE, &COMMENT_RE, &TAG_RE] {
        text = re.replace_all(&text, " ").into_owned();
    }

    decode_entities(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Paragraph text of a Word document, one paragraph per line.
pub fn docx_text(bytes: &[u8]) -> AppResult<String> {
    let mut archive = open_archive(bytes)?;
    let xml = read_zip_entry(&mut archive, "word/document.xml")?;

    let mut reader = Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(false);

    let mut out = String::new();
    let mut in_text = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::Text(t)) if in_text => {
                out.push_str(&t.unescape().map_err(ooxml_error)?);
            }
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"tab" => out.push('\t'),
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ooxml_error(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(out.trim_end().to_string())
}

/// First worksheet of an Excel workbook rendered as an aligned table.
pub fn xlsx_table(bytes: &[u8]) -> AppResult<String> {
    let mut archive = open_archive(bytes)?;
    let shared_strings = read_shared_strings(&mut archive)?;

    let mut sheets: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("xl/worksheets/sheet") && n.ends_with(".xml"))
        .map(str::to_string)
        .collect();
    sheets.sort_by_key(|name| {
        name.trim_start_matches("xl/worksheets/sheet")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });

    let first = sheets
        .first()
        .ok_or_else(|| AppError::Ingestion("Workbook has no worksheets".to_string()))?;
    let xml = read_zip_entry(&mut archive, first)?;
    let rows = read_sheet_rows(&xml, &shared_strings)?;

    Ok(render_table(&rows))
}

/// CSV records rendered as an aligned table.
pub fn csv_table(bytes: &[u8]) -> AppResult<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AppError::Ingestion(e.to_string()))?;
        rows.push(record.iter().map(|field| field.trim().to_string()).collect());
    }

    Ok(render_table(&rows))
}

/// Right-align every column to its widest cell, one row per line.
pub fn render_table(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    rows.iter()
        .map(|row| {
            widths
                .iter()
                .enumerate()
                .map(|(i, width)| {
                    let cell = row.get(i).map(String::as_str).unwrap_or("");
                    format!("{:>width$}", cell, width = width)
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn open_archive(bytes: &[u8]) -> AppResult<Archive<'_>> {
    zip::ZipArchive::new(Cursor::new(bytes)).map_err(ooxml_error)
}

fn read_zip_entry(archive: &mut Archive<'_>, name: &str) -> AppResult<Vec<u8>> {
    let entry = archive.by_name(name).map_err(ooxml_error)?;
    let mut out = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut out)
        .map_err(ooxml_error)?;

    if out.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(AppError::Ingestion(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, MAX_XML_ENTRY_BYTES
        )));
    }
    Ok(out)
}

fn read_shared_strings(archive: &mut Archive<'_>) -> AppResult<Vec<String>> {
    if archive.index_for_name("xl/sharedStrings.xml").is_none() {
        return Ok(Vec::new());
    }
    let xml = read_zip_entry(archive, "xl/sharedStrings.xml")?;

    let mut reader = Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(false);

    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                if let Some(s) = current.as_mut() {
                    s.push_str(&t.unescape().map_err(ooxml_error)?);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"si" => strings.extend(current.take()),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ooxml_error(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}

#[derive(Default)]
struct CellState {
    column: Option<usize>,
    kind: Option<String>,
    value: String,
    in_value: bool,
}

fn read_sheet_rows(xml: &[u8], shared_strings: &[String]) -> AppResult<Vec<Vec<String>>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell = CellState::default();
    let mut cells = 0usize;
    let mut buf = Vec::new();
    loop {
        if cells >= XLSX_MAX_CELLS {
            break;
        }
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => row = Vec::new(),
                b"c" => {
                    cell = CellState::default();
                    for attr in e.attributes().flatten() {
                        let value = String::from_utf8_lossy(&attr.value).into_owned();
                        match attr.key.as_ref() {
                            b"r" => cell.column = column_index(&value),
                            b"t" => cell.kind = Some(value),
                            _ => {}
                        }
                    }
                }
                b"v" | b"t" => cell.in_value = true,
                _ => {}
            },
            Ok(Event::Text(t)) if cell.in_value => {
                cell.value.push_str(&t.unescape().map_err(ooxml_error)?);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"v" | b"t" => cell.in_value = false,
                b"c" => {
                    let text = cell_text(&cell, shared_strings);
                    let column = cell.column.unwrap_or(row.len());
                    if row.len() <= column {
                        row.resize(column + 1, String::new());
                    }
                    row[column] = text;
                    cells += 1;
                }
                b"row" => rows.push(std::mem::take(&mut row)),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ooxml_error(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(rows)
}

fn cell_text(cell: &CellState, shared_strings: &[String]) -> String {
    let raw = cell.value.trim();
    match cell.kind.as_deref() {
        Some("s") => raw
            .parse::<usize>()
            .ok()
            .and_then(|i| shared_strings.get(i))
            .cloned()
            .unwrap_or_default(),
        Some("b") => (if raw == "1" { "True" } else { "False" }).to_string(),
        _ => raw.to_string(),
    }
}

/// Zero-based column index of a cell reference such as `"C7"`.
fn column_index(reference: &str) -> Option<usize> {
    let letters: Vec<char> = reference
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if letters.is_empty() {
        return None;
    }

    let number = letters.iter().fold(0usize, |acc, c| {
        acc * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1)
    });
    Some(number - 1)
}

fn ooxml_error(e: impl std::fmt::Display) -> AppError {
    AppError::Ingestion(format!("OOXML extraction failed: {}", e))
}
