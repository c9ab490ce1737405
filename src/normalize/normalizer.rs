//! Row normalization against a master schema

use super::types::{CellValue, NormalizedPage};
use crate::schema::values::{
    parse_bool, parse_decimal, parse_int, parse_timestamp, stringify, truncate_chars,
};
use crate::schema::{ColumnType, MasterSchema};
use crate::types::{JsonObject, JsonValue};
use std::sync::Arc;
use tracing::debug;

/// Integer digits allowed by `DECIMAL(18,2)`
const DECIMAL_INTEGER_DIGITS: usize = 16;

/// Decimal places kept by `DECIMAL(18,2)`
const DECIMAL_SCALE: usize = 2;

/// Normalizes pages against a shared schema
#[derive(Debug, Clone)]
pub struct Normalizer {
    schema: Arc<MasterSchema>,
    char_limit: usize,
}

impl Normalizer {
    /// Create a normalizer
    pub fn new(schema: Arc<MasterSchema>, char_limit: usize) -> Self {
        Self { schema, char_limit }
    }

    /// The schema pages are normalized against
    pub fn schema(&self) -> &MasterSchema {
        &self.schema
    }

    /// Normalize one page of raw rows
    pub fn normalize(&self, page: Option<u32>, rows: &[JsonValue]) -> NormalizedPage {
        let mut normalized = NormalizedPage {
            page,
            rows: Vec::with_capacity(rows.len()),
            skipped_rows: 0,
        };

        for row in rows {
            match row.as_object() {
                Some(object) => normalized.rows.push(self.normalize_row(object)),
                None => normalized.skipped_rows += 1,
            }
        }

        if normalized.skipped_rows > 0 {
            debug!(
                "Page {:?}: skipped {} non-object rows",
                page, normalized.skipped_rows
            );
        }

        normalized
    }

    /// Project one object onto the schema's columns
    pub fn normalize_row(&self, object: &JsonObject) -> Vec<CellValue> {
        self.schema
            .columns()
            .iter()
            .map(|column| {
                object
                    .get(&column.name)
                    .map_or(CellValue::Null, |value| {
                        self.convert(value, column.column_type)
                    })
            })
            .collect()
    }

    /// Convert one JSON value to a column type; unparseable values become null
    fn convert(&self, value: &JsonValue, column_type: ColumnType) -> CellValue {
        let Some(text) = stringify(value) else {
            return CellValue::Null;
        };

        let cell = match column_type {
            ColumnType::String => Some(CellValue::String(
                truncate_chars(&text, self.char_limit).to_string(),
            )),
            ColumnType::Int32 => parse_int(&text)
                .and_then(|v| i32::try_from(v).ok())
                .map(CellValue::Int32),
            ColumnType::Int64 => parse_int(&text).map(CellValue::Int64),
            ColumnType::Decimal => parse_decimal(&text)
                .and_then(|literal| canonical_decimal(&literal))
                .map(CellValue::Decimal),
            ColumnType::Bool => parse_bool(&text).map(CellValue::Bool),
            ColumnType::Timestamp => parse_timestamp(&text).map(CellValue::Timestamp),
        };

        cell.unwrap_or(CellValue::Null)
    }
}

/// Normalize one page against a schema
pub fn normalize_page(
    rows: &[JsonValue],
    schema: &MasterSchema,
    char_limit: usize,
) -> NormalizedPage {
    Normalizer::new(Arc::new(schema.clone()), char_limit).normalize(None, rows)
}

/// Rewrite a decimal literal as `[-]int[.frac]`, or `None` if it cannot fit `DECIMAL(18,2)`
fn canonical_decimal(literal: &str) -> Option<String> {
    let (negative, unsigned) = match literal.as_bytes().first() {
        Some(b'-') => (true, &literal[1..]),
        Some(b'+') => (false, &literal[1..]),
        _ => (false, literal),
    };

    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let int_part = int_part.trim_start_matches('0');

    if int_part.len() > DECIMAL_INTEGER_DIGITS
        || (int_part.len() == DECIMAL_INTEGER_DIGITS && rounds_up_to_overflow(int_part, frac_part))
    {
        return None;
    }

    let mut out = String::with_capacity(literal.len() + 1);
    if negative {
        out.push('-');
    }
    out.push_str(if int_part.is_empty() { "0" } else { int_part });
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    Some(out)
}

/// Whether rounding to the decimal scale carries into a 17th integer digit
fn rounds_up_to_overflow(int_part: &str, frac_part: &str) -> bool {
    let kept = frac_part.get(..DECIMAL_SCALE).unwrap_or(frac_part);
    let next = frac_part.as_bytes().get(DECIMAL_SCALE).copied().unwrap_or(b'0');

    int_part.bytes().all(|b| b == b'9')
        && kept.len() == DECIMAL_SCALE
        && kept.bytes().all(|b| b == b'9')
        && next >= b'5'
}
