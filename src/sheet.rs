//! Spreadsheet reading: CSV/TSV via the `csv` crate, XLSX via `calamine`.
//!
//! The reader contract downstream components rely on: the first row is the
//! header row, header text is trimmed, and empty cells are reported as a
//! distinct [`Cell::Empty`] marker so coercion rules can tell a blank cell
//! apart from literal text such as `"0"`.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use calamine::{Data, Reader, Xlsx, open_workbook};

use crate::io_utils;

/// A single cell as read from the input sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Text(String),
}

impl Cell {
    pub fn from_text(value: String) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Empty => None,
            Cell::Text(value) => Some(value.as_str()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

/// Headers plus data rows of a single sheet. Rows are padded with empty cells
/// to the header width; rows wider than the header row are truncated.
#[derive(Debug, Clone, Default)]
pub struct SheetData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl SheetData {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reads headers and data rows from `path`, dispatching on the extension:
/// `.xlsx` goes through calamine (first worksheet only), everything else is
/// treated as delimited text. `delimiter` and `encoding_label` only apply to
/// the delimited-text path.
pub fn read_rows(
    path: &Path,
    delimiter: Option<u8>,
    encoding_label: Option<&str>,
) -> Result<SheetData> {
    if is_xlsx(path) {
        read_xlsx(path)
    } else {
        read_delimited(path, delimiter, encoding_label)
    }
}

fn is_xlsx(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"))
}

fn read_delimited(
    path: &Path,
    delimiter: Option<u8>,
    encoding_label: Option<&str>,
) -> Result<SheetData> {
    let delimiter = io_utils::resolve_input_delimiter(path, delimiter);
    let encoding = io_utils::resolve_encoding(encoding_label)?;
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;

    let headers: Vec<String> = io_utils::reader_headers(&mut reader, encoding)?
        .into_iter()
        .map(|header| header.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", idx + 2))?;
        let decoded = io_utils::decode_record(&record, encoding)?;
        let mut cells: Vec<Cell> = decoded.into_iter().map(Cell::from_text).collect();
        cells.resize(headers.len(), Cell::Empty);
        if cells.iter().all(Cell::is_empty) {
            continue;
        }
        rows.push(cells);
    }

    Ok(SheetData { headers, rows })
}

fn read_xlsx(path: &Path) -> Result<SheetData> {
    let mut workbook: Xlsx<_> =
        open_workbook(path).with_context(|| format!("Opening workbook {path:?}"))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .ok_or_else(|| anyhow!("Workbook {path:?} has no sheets"))?
        .clone();

    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("Reading sheet '{sheet_name}'"))?;

    let mut row_iter = range.rows();
    let Some(header_row) = row_iter.next() else {
        return Ok(SheetData::default());
    };

    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| render_cell(cell).as_text().unwrap_or("").trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for row in row_iter {
        let mut cells: Vec<Cell> = row.iter().map(render_cell).collect();
        cells.resize(headers.len(), Cell::Empty);
        if cells.iter().all(Cell::is_empty) {
            continue;
        }
        rows.push(cells);
    }

    Ok(SheetData { headers, rows })
}

fn render_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::from_text(s.clone()),
        Data::Int(i) => Cell::Text(i.to_string()),
        Data::Float(f) => {
            // Excel stores integral values as floats; render 42.0 as "42".
            if f.fract() == 0.0 && f.abs() < 1e15 {
                Cell::Text((*f as i64).to_string())
            } else {
                Cell::Text(f.to_string())
            }
        }
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => Cell::Text(dt.as_f64().to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::from_text(s.clone()),
        Data::Error(_) => Cell::Empty,
    }
}
