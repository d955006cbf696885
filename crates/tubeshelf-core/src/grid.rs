//! Decoding import files into a grid of loosely-typed cells.
//!
//! Decoding is the only suspending step of an import: the file is read
//! asynchronously, turned into a [`Grid`], and the grid is then handed to
//! the synchronous parser in [`crate::sheet`].
//!
//! # Supported Formats
//!
//! - `.json` - an array of rows, each an array of string/number/bool/null cells
//! - `.csv` / `.tsv` - delimited text with double-quote escaping
//! - `.xlsx` - the first worksheet of an Excel workbook

use std::fmt;
use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, Xlsx};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Cell {
    /// Blank cell.
    #[default]
    Empty,
    /// Boolean cell.
    Bool(bool),
    /// Numeric cell.
    Number(f64),
    /// Text cell.
    Text(String),
}

impl Cell {
    /// Whether the cell counts as blank for row detection: empty, empty
    /// text, zero, NaN or `false`.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Bool(b) => !b,
            Self::Number(n) => *n == 0.0 || n.is_nan(),
            Self::Text(s) => s.is_empty(),
        }
    }

    /// Text rendering of the cell, `None` for a blank cell.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Number(n) => Some(n.to_string()),
            Self::Text(s) => Some(s.clone()),
        }
    }

    /// Trimmed text, `None` when missing or whitespace-only.
    #[must_use]
    pub fn trimmed_text(&self) -> Option<String> {
        self.as_text()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&Data> for Cell {
    fn from(value: &Data) -> Self {
        match value {
            Data::Empty => Self::Empty,
            Data::Bool(b) => Self::Bool(*b),
            Data::Int(n) => Self::Number(*n as f64),
            Data::Float(n) => Self::Number(*n),
            // Serial day number, as the sheet stores it.
            Data::DateTime(dt) => Self::Number(dt.as_f64()),
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Self::Text(s.clone()),
            Data::Error(e) => Self::Text(e.to_string()),
        }
    }
}

/// One row of cells.
pub type Row = Vec<Cell>;

/// A decoded sheet: rows of cells.
pub type Grid = Vec<Row>;

/// Import file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridFormat {
    /// JSON array of arrays.
    Json,
    /// Comma-separated values.
    Csv,
    /// Tab-separated values.
    Tsv,
    /// Excel workbook; only the first worksheet is read.
    Xlsx,
}

impl GridFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("csv") => Ok(Self::Csv),
            Some("tsv" | "tab") => Ok(Self::Tsv),
            Some("xlsx" | "xlsm") => Ok(Self::Xlsx),
            other => Err(Error::decode_failure(
                path.display().to_string(),
                format!("unsupported file type: {}", other.unwrap_or("<none>")),
            )),
        }
    }

}

impl fmt::Display for GridFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
            Self::Tsv => write!(f, "tsv"),
            Self::Xlsx => write!(f, "xlsx"),
        }
    }
}

/// Read and decode an import file.
pub async fn decode_file(path: &Path) -> Result<Grid> {
    let format = GridFormat::from_path(path)?;
    let source_name = path.display().to_string();

    debug!("Reading {} as {}", source_name, format);
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| Error::decode_failure(&source_name, format!("failed to read file: {e}")))?;

    let grid = decode_bytes(format, &source_name, &bytes)?;
    info!("Decoded {} rows from {}", grid.len(), source_name);
    Ok(grid)
}

/// Decode raw file content into a grid.
pub fn decode_bytes(format: GridFormat, source_name: &str, bytes: &[u8]) -> Result<Grid> {
    let grid = match format {
        GridFormat::Xlsx => decode_workbook(bytes),
        GridFormat::Json => decode_text(bytes).and_then(|text| {
            serde_json::from_str::<Grid>(text).map_err(|e| format!("invalid JSON grid: {e}"))
        }),
        GridFormat::Csv => decode_text(bytes).and_then(|text| decode_delimited(text, ',')),
        GridFormat::Tsv => decode_text(bytes).and_then(|text| decode_delimited(text, '\t')),
    };

    grid.map_err(|reason| Error::decode_failure(source_name, reason))
}

fn decode_text(bytes: &[u8]) -> std::result::Result<&str, String> {
    let text = std::str::from_utf8(bytes).map_err(|e| format!("invalid UTF-8: {e}"))?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

/// Rows of the first worksheet, starting at its first used cell.
fn decode_workbook(bytes: &[u8]) -> std::result::Result<Grid, String> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes)).map_err(|e| format!("invalid workbook: {e}"))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| "workbook has no worksheets".to_string())?
        .map_err(|e| format!("unreadable worksheet: {e}"))?;

    debug!("First worksheet spans {:?}", range.get_size());
    Ok(range
        .rows()
        .map(|row| row.iter().map(Cell::from).collect())
        .collect())
}

/// Split delimited text into rows, honouring double-quoted fields.
fn decode_delimited(text: &str, delimiter: char) -> std::result::Result<Grid, String> {
    let mut grid = Grid::new();
    let mut row = Row::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut line = 1usize;
    let mut chars = text.chars().peekable();

    let finish_field = |field: &mut String, quoted: &mut bool, row: &mut Row| {
        let value = std::mem::take(field);
        if value.is_empty() && !*quoted {
            row.push(Cell::Empty);
        } else {
            row.push(Cell::Text(value));
        }
        *quoted = false;
    };

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => {
                in_quotes = true;
                quoted = true;
            }
            c if c == delimiter => finish_field(&mut field, &mut quoted, &mut row),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                finish_field(&mut field, &mut quoted, &mut row);
                grid.push(std::mem::take(&mut row));
                line += 1;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(format!("unterminated quoted field at line {line}"));
    }

    if !field.is_empty() || quoted || !row.is_empty() {
        finish_field(&mut field, &mut quoted, &mut row);
        grid.push(row);
    }

    // A lone empty cell is how a blank line decodes; keep it as an empty row.
    for row in &mut grid {
        if row.len() == 1 && row[0] == Cell::Empty {
            row.clear();
        }
    }

    Ok(grid)
}
