use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::{debug, info};

use crate::errors::{ImportError, ImportResult};
use crate::import::TabularData;

/// Tabular file formats, picked by extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Tsv,
    Workbook,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> ImportResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "csv" => Ok(TableFormat::Csv),
            "tsv" | "tab" => Ok(TableFormat::Tsv),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(TableFormat::Workbook),
            _ => Err(ImportError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Read a CSV, TSV or the first sheet of a workbook into headers and rows.
pub fn load_table(path: &Path) -> ImportResult<TabularData> {
    let table = match TableFormat::from_path(path)? {
        TableFormat::Csv => load_delimited(path, b',')?,
        TableFormat::Tsv => load_delimited(path, b'\t')?,
        TableFormat::Workbook => load_workbook(path)?,
    };
    info!(
        "Loaded {}: {} columns, {} rows",
        path.display(),
        table.width(),
        table.rows.len()
    );
    Ok(table)
}

fn normalize_row(mut row: Vec<String>, width: usize) -> Vec<String> {
    row.resize(width, String::new());
    row
}

pub fn load_delimited(path: &Path, delimiter: u8) -> ImportResult<TabularData> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.is_empty() {
        return Err(ImportError::EmptyTable(path.display().to_string()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|c| c.is_empty()) {
            continue;
        }
        rows.push(normalize_row(
            record.iter().map(str::to_string).collect(),
            headers.len(),
        ));
    }

    Ok(TabularData::new(headers, rows))
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

/// First worksheet of an xlsx/xls/ods workbook. The first row is the header.
pub fn load_workbook(path: &Path) -> ImportResult<TabularData> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| ImportError::Spreadsheet(e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ImportError::EmptyTable(path.display().to_string()))?;
    debug!("Reading sheet '{}' from {}", sheet_name, path.display());

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ImportError::Spreadsheet(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|r| r.iter().map(|c| cell_to_string(c).trim().to_string()).collect())
        .unwrap_or_default();
    if headers.is_empty() {
        return Err(ImportError::EmptyTable(sheet_name));
    }

    let data = rows
        .map(|r| r.iter().map(cell_to_string).collect::<Vec<String>>())
        .filter(|r| r.iter().any(|c| !c.is_empty()))
        .map(|r| normalize_row(r, headers.len()))
        .collect();

    Ok(TabularData::new(headers, data))
}
