//! Reads `.xlsx` bytes into an [`ExcelWorkbook`].

use std::collections::HashSet;
use std::io::Cursor;
use std::sync::LazyLock;

use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};
use chrono::{NaiveDate, Utc};
use regex::Regex;

use crate::error::AppError;
use crate::excel::model::{
    cell_address, column_letter, CellType, CellValue, ColumnDataType, ColumnType, ExcelCell,
    ExcelWorkbook, ExcelWorksheet, FormulaCell,
};

/// Share of non-null values a column needs before it is typed number or date.
const TYPE_THRESHOLD: f64 = 0.7;
const SAMPLE_SIZE: usize = 5;

static CELL_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$?[A-Z]+\$?\d+").expect("valid cell reference regex"));

static DATE_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,4}[-/]\d{1,2}[-/]\d{1,4}").expect("valid date regex"));

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%m-%d-%Y", "%d/%m/%Y"];

/// Distinct A1 references in a formula, in order of first appearance.
pub fn extract_dependencies(formula: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    CELL_REFERENCE
        .find_iter(formula)
        .map(|m| m.as_str().to_string())
        .filter(|r| seen.insert(r.clone()))
        .collect()
}

/// Parse a workbook, refusing grids that together exceed `max_cells`.
///
/// The grid is dense from A1, so one far-away cell costs its whole
/// rectangle and is counted that way.
pub fn parse_workbook(
    bytes: &[u8],
    file_name: &str,
    max_cells: usize,
) -> Result<ExcelWorkbook, AppError> {
    let mut reader: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e| AppError::Workbook(format!("Failed to parse Excel file: {e}")))?;

    let mut sheets = Vec::new();
    let mut remaining = max_cells;
    for (index, name) in reader.sheet_names().into_iter().enumerate() {
        let values = reader
            .worksheet_range(&name)
            .map_err(|e| AppError::Workbook(format!("Failed to read sheet '{name}': {e}")))?;
        // Sheets without formulas still parse.
        let formulas = reader.worksheet_formula(&name).unwrap_or_default();

        let (rows, cols) = grid_size(&values, &formulas);
        let cells = rows.saturating_mul(cols);
        if cells > remaining {
            tracing::warn!(file_name, sheet = %name, rows, cols, "Workbook exceeds cell limit");
            return Err(AppError::Workbook(format!(
                "Sheet '{name}' spans {rows} rows by {cols} columns; workbooks are limited to {max_cells} cells"
            )));
        }
        remaining -= cells;

        sheets.push(build_worksheet(index, &name, &values, &formulas, rows, cols));
    }

    let now = Utc::now();
    tracing::info!(file_name, sheets = sheets.len(), "Parsed workbook");

    Ok(ExcelWorkbook {
        id: format!("workbook_{}", now.timestamp_millis()),
        name: file_name.to_string(),
        sheets,
        upload_date: now,
        file_size: bytes.len(),
        last_modified: now,
    })
}

fn build_worksheet(
    index: usize,
    name: &str,
    values: &Range<Data>,
    formulas: &Range<String>,
    row_count: usize,
    column_count: usize,
) -> ExcelWorksheet {
    let mut data = Vec::with_capacity(row_count);
    let mut formula_cells = Vec::new();

    for row in 0..row_count {
        let mut cells = Vec::with_capacity(column_count);
        for col in 0..column_count {
            let pos = (row as u32, col as u32);
            let address = cell_address(row, col);
            let raw = values.get_value(pos).unwrap_or(&Data::Empty);
            let formula = formulas
                .get_value(pos)
                .filter(|f| !f.is_empty())
                .map(|f| f.trim_start_matches('=').to_string());

            let (mut value, mut cell_type) = convert(raw);
            if let Some(formula) = &formula {
                if value == CellValue::Empty {
                    value = CellValue::Text(String::new());
                }
                cell_type = CellType::Formula;
                formula_cells.push(FormulaCell {
                    address: address.clone(),
                    formula: formula.clone(),
                    dependencies: extract_dependencies(formula),
                    result: value.clone(),
                });
            }

            cells.push(ExcelCell {
                value,
                cell_type,
                address,
                formula,
            });
        }
        data.push(cells);
    }

    let headers: Vec<String> = data
        .first()
        .map(|row| row.iter().map(|c| header_text(&c.value)).collect())
        .unwrap_or_default();

    let data_types = headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            let column: Vec<&CellValue> = data.iter().skip(1).filter_map(|r| r.get(col)).map(|c| &c.value).collect();
            analyze_column(col, header, &column, row_count)
        })
        .collect();

    ExcelWorksheet {
        id: format!("sheet_{index}"),
        name: name.to_string(),
        data,
        headers,
        row_count,
        column_count,
        data_types,
        has_formulas: !formula_cells.is_empty(),
        formula_cells,
    }
}

/// Rows and columns of the dense grid covering both ranges.
fn grid_size(values: &Range<Data>, formulas: &Range<String>) -> (usize, usize) {
    let (value_rows, value_cols) = extent(values.end());
    let (formula_rows, formula_cols) = extent(formulas.end());
    (value_rows.max(formula_rows), value_cols.max(formula_cols))
}

/// Rows and columns covered from A1 to `end`. An empty sheet is a single blank cell.
fn extent(end: Option<(u32, u32)>) -> (usize, usize) {
    match end {
        Some((row, col)) => (row as usize + 1, col as usize + 1),
        None => (1, 1),
    }
}

fn convert(raw: &Data) -> (CellValue, CellType) {
    match raw {
        Data::Empty => (CellValue::Empty, CellType::Empty),
        Data::String(s) => (CellValue::Text(s.clone()), CellType::String),
        Data::Float(f) => (CellValue::Number(*f), CellType::Number),
        Data::Int(i) => (CellValue::Number(*i as f64), CellType::Number),
        Data::Bool(b) => (CellValue::Bool(*b), CellType::Boolean),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(d) if d.time() == chrono::NaiveTime::MIN => {
                (CellValue::Text(d.date().format("%Y-%m-%d").to_string()), CellType::Date)
            }
            Some(d) => (CellValue::Text(d.format("%Y-%m-%dT%H:%M:%S").to_string()), CellType::Date),
            None => (CellValue::Number(dt.as_f64()), CellType::Number),
        },
        Data::DateTimeIso(s) => (CellValue::Text(s.clone()), CellType::Date),
        Data::DurationIso(s) => (CellValue::Text(s.clone()), CellType::String),
        Data::Error(e) => (CellValue::Text(e.to_string()), CellType::String),
    }
}

fn header_text(value: &CellValue) -> String {
    match value {
        CellValue::Empty => String::new(),
        other => other.to_string(),
    }
}

fn is_numeric(value: &CellValue) -> bool {
    match value {
        CellValue::Number(_) | CellValue::Bool(_) => true,
        CellValue::Text(s) => {
            let s = s.trim();
            !s.is_empty() && s.parse::<f64>().is_ok()
        }
        CellValue::Empty => false,
    }
}

fn is_date(value: &CellValue) -> bool {
    let CellValue::Text(s) = value else {
        return false;
    };
    let Some(m) = DATE_LIKE.find(s) else {
        return false;
    };
    DATE_FORMATS
        .iter()
        .any(|fmt| NaiveDate::parse_from_str(m.as_str(), fmt).is_ok())
}

/// Type a column from its data rows (everything below the header row).
pub fn analyze_column(
    index: usize,
    header: &str,
    values: &[&CellValue],
    row_count: usize,
) -> ColumnDataType {
    let non_null: Vec<&CellValue> = values.iter().copied().filter(|v| !v.is_blank()).collect();

    let mut seen = HashSet::new();
    let unique: Vec<&CellValue> = non_null
        .iter()
        .copied()
        .filter(|v| seen.insert(v.distinct_key()))
        .collect();

    let data_type = if non_null.is_empty() {
        ColumnType::Text
    } else {
        let total = non_null.len() as f64;
        let numbers = non_null.iter().filter(|v| is_numeric(v)).count() as f64;
        let dates = non_null.iter().filter(|v| is_date(v)).count() as f64;
        if numbers / total > TYPE_THRESHOLD {
            ColumnType::Number
        } else if dates / total > TYPE_THRESHOLD {
            ColumnType::Date
        } else {
            ColumnType::Text
        }
    };

    ColumnDataType {
        column_index: index,
        column_letter: column_letter(index),
        header: if header.is_empty() {
            format!("Column {}", index + 1)
        } else {
            header.to_string()
        },
        data_type,
        sample_values: unique.iter().take(SAMPLE_SIZE).map(|v| (*v).clone()).collect(),
        unique_count: unique.len(),
        null_count: row_count.saturating_sub(1).saturating_sub(non_null.len()),
        pattern: None,
    }
}
