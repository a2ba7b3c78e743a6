//! Row ingestion: turns spreadsheet rows exported as JSON objects into card records.
//!
//! Column detection:
//! - name column: first header containing "nombre" or "name" (case-insensitive)
//! - role column: first header containing "cargo" or "role"
//! - neither found but exactly two columns → first is name, second is role
//!
//! Values are stringified, trimmed and upper-cased. Missing cells become "".
//!
//! Rows arrive either as JSON objects or from the first worksheet of a workbook
//! (`.xlsx`, `.xls`, `.ods`), whose header row supplies the keys.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde_json::{Map, Number, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::layout::Record;

const NAME_HINTS: &[&str] = &["nombre", "name"];
const ROLE_HINTS: &[&str] = &["cargo", "role"];

pub type Row = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("the sheet has no rows")]
    Empty,

    #[error("could not find name/role columns in headers [{}]; expected 'nombre' and 'cargo' or exactly two columns", .headers.join(", "))]
    MissingColumns { headers: Vec<String> },

    #[error("could not read workbook: {0}")]
    Workbook(String),
}

/// Which header holds which field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub name: String,
    pub role: String,
}

/// Picks the name and role columns from `headers` (in sheet order).
pub fn detect_columns(headers: &[String]) -> Result<ColumnMapping, IngestError> {
    let find = |hints: &[&str]| {
        headers
            .iter()
            .find(|h| {
                let lower = h.to_lowercase();
                hints.iter().any(|hint| lower.contains(hint))
            })
            .cloned()
    };

    match (find(NAME_HINTS), find(ROLE_HINTS)) {
        (Some(name), Some(role)) if name != role => Ok(ColumnMapping { name, role }),
        _ if headers.len() == 2 => {
            warn!(
                first = %headers[0],
                second = %headers[1],
                "no 'nombre'/'cargo' headers, using the first two columns"
            );
            Ok(ColumnMapping {
                name: headers[0].clone(),
                role: headers[1].clone(),
            })
        }
        _ => Err(IngestError::MissingColumns {
            headers: headers.to_vec(),
        }),
    }
}

/// Converts rows into normalized records, keeping row order.
pub fn records_from_rows(rows: &[Row]) -> Result<Vec<Record>, IngestError> {
    let first = rows.first().ok_or(IngestError::Empty)?;
    let headers: Vec<String> = first.keys().cloned().collect();
    let mapping = detect_columns(&headers)?;
    info!(
        name_column = %mapping.name,
        role_column = %mapping.role,
        rows = rows.len(),
        "ingesting rows"
    );

    Ok(rows
        .iter()
        .map(|row| Record {
            name: normalize(row.get(&mapping.name)),
            role: normalize(row.get(&mapping.role)),
        })
        .collect())
}

// ────────────────────────────────────────────────────────────────────────────
// Workbooks
// ────────────────────────────────────────────────────────────────────────────

/// Reads the first worksheet of a workbook into rows keyed by its header row.
///
/// Empty cells become `""`, blank rows are skipped, and whole-number floats come
/// back as integers so `42` does not turn into `"42.0"`. Empty headers are named
/// `__EMPTY`, `__EMPTY_1`, ... and repeated headers get a `_1`, `_2` suffix.
pub fn rows_from_workbook(bytes: &[u8]) -> Result<Vec<Row>, IngestError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| IngestError::Workbook(e.to_string()))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| IngestError::Workbook("workbook has no sheets".to_string()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| IngestError::Workbook(e.to_string()))?;

    let mut sheet_rows = range.rows();
    let Some(header_cells) = sheet_rows.next() else {
        return Ok(Vec::new());
    };
    let headers = header_keys(header_cells);

    let rows: Vec<Row> = sheet_rows
        .filter(|cells| cells.iter().any(|cell| !is_blank(cell)))
        .map(|cells| {
            headers
                .iter()
                .enumerate()
                .map(|(i, key)| (key.clone(), cell_value(cells.get(i))))
                .collect()
        })
        .collect();

    info!(sheet = %sheet_name, rows = rows.len(), "workbook read");
    Ok(rows)
}

fn header_keys(cells: &[Data]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::with_capacity(cells.len());
    let mut empty = 0usize;
    for cell in cells {
        let text = cell.to_string().trim().to_string();
        let base = if text.is_empty() {
            let name = match empty {
                0 => "__EMPTY".to_string(),
                n => format!("__EMPTY_{n}"),
            };
            empty += 1;
            name
        } else {
            text
        };

        let mut key = base.clone();
        let mut suffix = 1;
        while keys.contains(&key) {
            key = format!("{base}_{suffix}");
            suffix += 1;
        }
        keys.push(key);
    }
    keys
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn cell_value(cell: Option<&Data>) -> Value {
    match cell {
        None | Some(Data::Empty) => Value::String(String::new()),
        Some(Data::String(s)) => Value::String(s.clone()),
        Some(Data::Bool(b)) => Value::Bool(*b),
        Some(Data::Int(i)) => Value::from(*i),
        Some(Data::Float(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            Value::from(*f as i64)
        }
        Some(Data::Float(f)) => Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(f.to_string())),
        Some(other) => Value::String(other.to_string()),
    }
}

fn normalize(value: Option<&Value>) -> String {
    let raw = match value {
        None | Some(Value::Null) => return String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    raw.trim().to_uppercase()
}
