//! Table loader with encoding, delimiter and format auto-detection.
//!
//! Produces a [`RawTable`]: header names plus untyped cells. Turning cells
//! into report records happens in [`records`].
//!
//! - CSV: encoding detected with `chardet` (UTF-8, Windows-1251, KOI8-R, ...),
//!   delimiter guessed from the header line.
//! - XLSX: first worksheet, read with `calamine` (see [`xlsx`]).

pub mod records;
pub mod xlsx;

use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{LoadError, LoadResult};
use crate::models::Number;

pub use records::{extract_records, ExtractOptions, ExtractedRecords, REQUIRED_COLUMNS};

/// An input cell before interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(Number),
    Date(NaiveDate),
}

impl Cell {
    /// A CSV field. Blank text is empty.
    pub fn from_text(text: &str) -> Cell {
        let trimmed = text.trim().trim_matches('"').trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Text rendering, `None` for empty cells.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        }
    }
}

/// Header names plus rows of cells. Rows are padded to the header width.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Kind of file a table was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Xlsx,
}

/// Result of parsing with metadata.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub table: RawTable,
    pub format: SourceFormat,
    /// Detected encoding (CSV only).
    pub encoding: Option<String>,
    /// Detected delimiter (CSV only).
    pub delimiter: Option<char>,
}

/// Detect the encoding of raw bytes.
///
/// Valid UTF-8 wins outright; otherwise `chardet` decides.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let charset = chardet::detect(bytes).0;
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "windows-1251" | "cp1251" => "windows-1251".to_string(),
        "koi8-r" => "koi8-r".to_string(),
        "ibm866" | "cp866" => "ibm866".to_string(),
        "iso-8859-5" => "iso-8859-5".to_string(),
        "maccyrillic" | "x-mac-cyrillic" => "x-mac-cyrillic".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-15".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the given encoding label.
pub fn decode_content(bytes: &[u8], encoding: &str) -> LoadResult<String> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    if matches!(encoding.to_lowercase().as_str(), "utf-8" | "utf8" | "ascii") {
        return Ok(match String::from_utf8(bytes.to_vec()) {
            Ok(s) => s,
            Err(_) => {
                warn!("Input is not valid UTF-8, decoding lossily");
                String::from_utf8_lossy(bytes).into_owned()
            }
        });
    }

    let codec = encoding_rs::Encoding::for_label(encoding.as_bytes()).ok_or_else(|| {
        LoadError::Encoding {
            encoding: encoding.to_string(),
        }
    })?;
    let (decoded, _, had_errors) = codec.decode(bytes);
    if had_errors {
        warn!(encoding, "Some bytes could not be decoded and were replaced");
    }
    Ok(decoded.into_owned())
}

/// Detect the delimiter by counting occurrences in the first line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ';';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV text with an explicit delimiter.
pub fn parse_csv_str(content: &str, delimiter: char) -> LoadResult<RawTable> {
    if content.trim().is_empty() {
        return Err(LoadError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_matches('"').trim().to_string())
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(LoadError::NoHeaders);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let row = (0..headers.len())
            .map(|i| record.get(i).map(Cell::from_text).unwrap_or(Cell::Empty))
            .collect();
        rows.push(row);
    }

    Ok(RawTable { headers, rows })
}

/// Parse bytes of a CSV or XLSX file, auto-detecting which.
pub fn parse_bytes_auto(bytes: &[u8]) -> LoadResult<ParseResult> {
    if bytes.is_empty() {
        return Err(LoadError::EmptyFile);
    }

    if xlsx::looks_like_xlsx(bytes) {
        let table = xlsx::read_xlsx_bytes(bytes)?;
        debug!(rows = table.rows.len(), "Parsed XLSX input");
        return Ok(ParseResult {
            table,
            format: SourceFormat::Xlsx,
            encoding: None,
            delimiter: None,
        });
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    let table = parse_csv_str(&content, delimiter)?;
    debug!(rows = table.rows.len(), %encoding, ?delimiter, "Parsed CSV input");

    Ok(ParseResult {
        table,
        format: SourceFormat::Csv,
        encoding: Some(encoding),
        delimiter: Some(delimiter),
    })
}

/// Parse a CSV or XLSX file with auto-detection.
pub fn parse_file_auto<P: AsRef<Path>>(path: P) -> LoadResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}
