//! Normalized page types

use chrono::NaiveDateTime;

/// One typed cell of a normalized row
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    String(String),
    Int32(i32),
    Int64(i64),
    /// Canonical fixed-point text, e.g. `-12.5`
    Decimal(String),
    Bool(bool),
    Timestamp(NaiveDateTime),
}

impl CellValue {
    /// Whether the cell is null
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Text form accepted by a SQL `CAST` to the column's type
    pub fn to_sql_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::String(s) | CellValue::Decimal(s) => Some(s.clone()),
            CellValue::Int32(v) => Some(v.to_string()),
            CellValue::Int64(v) => Some(v.to_string()),
            CellValue::Bool(v) => Some(v.to_string()),
            CellValue::Timestamp(v) => Some(v.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
        }
    }
}

/// One page after normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedPage {
    /// Source page number, `None` for unpaginated requests
    pub page: Option<u32>,
    /// Rows in schema column order
    pub rows: Vec<Vec<CellValue>>,
    /// Non-object array elements that were skipped
    pub skipped_rows: usize,
}

impl NormalizedPage {
    /// Number of normalized rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether the page has no rows to load
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
