//! Base rule import from uploaded CSV or XLSX sheets.
//!
//! The header row names the columns (`objectType`, `ruleType`, `value`,
//! `description`, `severityRating`). Each data row becomes one upload row and
//! the batch goes through the same all-or-nothing pipeline as the JSON upload.

use std::io::Cursor;

use calamine::{open_workbook_from_rs, Reader, Xlsx};
use serde_json::{Map, Value};
use sqlx::PgPool;

use crate::errors::AppError;
use crate::services::base_rule;

/// Supported sheet formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Xlsx,
}

impl SheetFormat {
    /// Detect format from filename extension.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let lower = filename.to_lowercase();
        if lower.ends_with(".csv") {
            Some(Self::Csv)
        } else if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
            Some(Self::Xlsx)
        } else {
            None
        }
    }
}

/// Turn header names and cell texts into one JSON object per row.
fn rows_to_values(headers: &[String], records: Vec<Vec<String>>) -> Vec<Value> {
    records
        .into_iter()
        .filter(|cells| cells.iter().any(|c| !c.trim().is_empty()))
        .map(|cells| {
            let mut row = Map::new();
            for (header, cell) in headers.iter().zip(cells) {
                if !header.is_empty() {
                    row.insert(header.clone(), Value::String(cell));
                }
            }
            Value::Object(row)
        })
        .collect()
}

/// Parse CSV data into row objects keyed by header.
pub fn parse_csv(data: &[u8]) -> Result<Vec<Value>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::Validation(format!("Invalid CSV headers: {e}")))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut records: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| AppError::Validation(format!("CSV parse error: {e}")))?;
        records.push(record.iter().map(|c| c.to_string()).collect());
    }

    Ok(rows_to_values(&headers, records))
}

/// Parse the first sheet of an XLSX workbook into row objects keyed by header.
pub fn parse_xlsx(data: &[u8]) -> Result<Vec<Value>, AppError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(data))
        .map_err(|e| AppError::Validation(format!("Invalid XLSX file: {e}")))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| AppError::Validation("XLSX file has no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| AppError::Validation(format!("Failed to read sheet '{sheet_name}': {e}")))?;

    let mut row_iter = range.rows();
    let headers: Vec<String> = row_iter
        .next()
        .ok_or_else(|| AppError::Validation("XLSX sheet is empty".to_string()))?
        .iter()
        .map(|cell| cell.to_string().trim().to_string())
        .collect();

    let records: Vec<Vec<String>> = row_iter
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();

    Ok(rows_to_values(&headers, records))
}

/// Import base rules from an uploaded sheet.
pub async fn import_sheet(
    pool: &PgPool,
    data: &[u8],
    format: SheetFormat,
    default_severity: i32,
) -> Result<String, AppError> {
    let rows = match format {
        SheetFormat::Csv => parse_csv(data)?,
        SheetFormat::Xlsx => parse_xlsx(data)?,
    };
    if rows.is_empty() {
        return Err(AppError::Validation("Uploaded sheet has no rows.".to_string()));
    }

    tracing::info!(rows = rows.len(), ?format, "Importing base rules from sheet");
    base_rule::upload_rows(pool, &rows, default_severity).await
}
