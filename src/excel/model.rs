//! Workbook data model shared by the parser, the analysis and the API.
//!
//! Every struct defaults its fields on deserialization so that partially
//! filled workbooks sent back by clients can still be analysed.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw cell value. `Empty` serializes as JSON `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Empty cells and empty strings both count as missing.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Key used to count distinct values. Keeps `1` and `"1"` apart.
    pub fn distinct_key(&self) -> String {
        match self {
            CellValue::Empty => "e:".to_string(),
            CellValue::Bool(b) => format!("b:{b}"),
            CellValue::Number(n) => format!("n:{n}"),
            CellValue::Text(s) => format!("s:{s}"),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => write!(f, "null"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    String,
    Number,
    Date,
    Boolean,
    Formula,
    #[default]
    Empty,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcelCell {
    pub value: CellValue,
    #[serde(rename = "type")]
    pub cell_type: CellType,
    /// A1-style address, e.g. `"B2"`.
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormulaCell {
    pub address: String,
    pub formula: String,
    /// Distinct cell references in order of first appearance.
    pub dependencies: Vec<String>,
    pub result: CellValue,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    Text,
    Number,
    Date,
    Currency,
    Percentage,
    Mixed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnDataType {
    pub column_index: usize,
    pub column_letter: String,
    pub header: String,
    pub data_type: ColumnType,
    pub sample_values: Vec<CellValue>,
    pub unique_count: usize,
    pub null_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl ColumnDataType {
    /// The stored letter, or one derived from the index when absent.
    pub fn letter(&self) -> String {
        if self.column_letter.is_empty() {
            column_letter(self.column_index)
        } else {
            self.column_letter.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExcelWorksheet {
    pub id: String,
    pub name: String,
    /// Dense row-major grid starting at A1.
    pub data: Vec<Vec<ExcelCell>>,
    pub headers: Vec<String>,
    pub row_count: usize,
    pub column_count: usize,
    pub data_types: Vec<ColumnDataType>,
    pub has_formulas: bool,
    pub formula_cells: Vec<FormulaCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExcelWorkbook {
    pub id: String,
    pub name: String,
    pub sheets: Vec<ExcelWorksheet>,
    pub upload_date: DateTime<Utc>,
    pub file_size: usize,
    pub last_modified: DateTime<Utc>,
}

/// Zero-based column index to spreadsheet letters (`0 -> A`, `26 -> AA`).
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Spreadsheet letters back to a zero-based index.
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0usize, |acc, c| {
        if c.is_ascii_uppercase() {
            Some(acc * 26 + (c as usize - 'A' as usize + 1))
        } else {
            None
        }
    })
    .map(|n| n - 1)
}

/// Zero-based (row, column) to an A1 address.
pub fn cell_address(row: usize, col: usize) -> String {
    format!("{}{}", column_letter(col), row + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(701), "ZZ");
        assert_eq!(column_letter(702), "AAA");

        for i in [0, 7, 25, 26, 51, 52, 701, 702, 16383] {
            assert_eq!(column_index(&column_letter(i)), Some(i));
        }
        assert_eq!(column_index("a1"), None);
        assert_eq!(cell_address(1, 2), "C2");
    }

    #[test]
    fn test_cell_value_json() {
        assert_eq!(serde_json::to_string(&CellValue::Empty).unwrap(), "null");
        let values: Vec<CellValue> = serde_json::from_str(r#"[null, true, 2.5, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                CellValue::Empty,
                CellValue::Bool(true),
                CellValue::Number(2.5),
                CellValue::Text("x".to_string())
            ]
        );
    }

    #[test]
    fn test_cell_value_display() {
        assert_eq!(CellValue::Number(5.0).to_string(), "5");
        assert_eq!(CellValue::Number(1299.99).to_string(), "1299.99");
        assert_eq!(CellValue::Text("North".to_string()).to_string(), "North");
    }

    #[test]
    fn test_partial_workbook_deserializes() {
        let json = r#"{"name":"q1.xlsx","sheets":[{"name":"Data","rowCount":12,"formulaCells":[{"formula":"SUM(A1:A3)"}]}]}"#;
        let workbook: ExcelWorkbook = serde_json::from_str(json).unwrap();
        assert_eq!(workbook.sheets[0].row_count, 12);
        assert_eq!(workbook.sheets[0].formula_cells[0].formula, "SUM(A1:A3)");
        assert!(workbook.sheets[0].data_types.is_empty());
    }
}
