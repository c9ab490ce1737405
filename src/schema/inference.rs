//! Schema inference from sampled JSON rows

use super::types::{ColumnSchema, ColumnType, InferenceOptions, MasterSchema};
use super::values::{parse_bool, parse_decimal, parse_int, parse_timestamp, stringify};
use crate::types::JsonValue;
use std::collections::HashMap;

/// Schema inferrer with configuration options
#[derive(Debug, Clone, Default)]
pub struct SchemaInferrer {
    options: InferenceOptions,
}

impl SchemaInferrer {
    /// Create a new schema inferrer with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an inferrer with the given options
    pub fn with_options(options: InferenceOptions) -> Self {
        Self { options }
    }

    /// Get the options
    pub fn options(&self) -> &InferenceOptions {
        &self.options
    }

    /// Infer the columns of one page
    ///
    /// Columns appear in first-seen order across the page's objects. Returns
    /// `None` when the page holds no object rows or the objects have no keys.
    pub fn infer_page(&self, rows: &[JsonValue]) -> Option<Vec<ColumnSchema>> {
        let objects: Vec<_> = rows
            .iter()
            .filter_map(JsonValue::as_object)
            .take(self.options.sample_size.max(1))
            .collect();

        if objects.is_empty() {
            return None;
        }

        let mut order: Vec<&str> = Vec::new();
        let mut observed: HashMap<&str, Vec<String>> = HashMap::new();

        for object in &objects {
            for (key, value) in *object {
                let values = observed.entry(key.as_str()).or_insert_with(|| {
                    order.push(key.as_str());
                    Vec::new()
                });
                if let Some(text) = stringify(value).filter(|s| !s.trim().is_empty()) {
                    values.push(text);
                }
            }
        }

        if order.is_empty() {
            return None;
        }

        let columns = order
            .into_iter()
            .map(|name| {
                let values = observed.get(name).map(Vec::as_slice).unwrap_or_default();
                let nullable = values.len() < objects.len();
                ColumnSchema::new(name, self.infer_column_type(values), nullable)
            })
            .collect();

        Some(columns)
    }

    /// Decide a column type from its non-null textual values
    pub fn infer_column_type(&self, values: &[String]) -> ColumnType {
        if values.is_empty() {
            return ColumnType::String;
        }

        let threshold = self.options.effective_threshold();
        let total = values.len() as f64;
        let meets = |count: usize| count as f64 / total >= threshold;

        if self.options.infer_numeric {
            let ints: Vec<i64> = values.iter().filter_map(|v| parse_int(v)).collect();
            if meets(ints.len()) {
                let fits_i32 = ints.iter().all(|v| i32::try_from(*v).is_ok());
                return if fits_i32 {
                    ColumnType::Int32
                } else {
                    ColumnType::Int64
                };
            }

            let decimals = values.iter().filter(|v| parse_decimal(v).is_some()).count();
            if meets(decimals) {
                return ColumnType::Decimal;
            }
        }

        if self.options.infer_booleans && values.iter().all(|v| parse_bool(v).is_some()) {
            return ColumnType::Bool;
        }

        if self.options.infer_dates {
            let timestamps = values
                .iter()
                .filter(|v| parse_timestamp(v).is_some())
                .count();
            if meets(timestamps) {
                return ColumnType::Timestamp;
            }
        }

        ColumnType::String
    }
}

/// Infer the columns of one page with the given options
pub fn infer_page_schema(
    rows: &[JsonValue],
    options: &InferenceOptions,
) -> Option<Vec<ColumnSchema>> {
    SchemaInferrer::with_options(options.clone()).infer_page(rows)
}

/// Merge per-page schemas into a [`MasterSchema`]
///
/// The result is the union of all columns in first-seen order. A column's
/// type is the one inferred by the first page that saw it. Returns `None`
/// when no page produced a schema.
pub fn merge_page_schemas<I>(pages: I) -> Option<MasterSchema>
where
    I: IntoIterator<Item = Vec<ColumnSchema>>,
{
    let mut merged: Option<MasterSchema> = None;

    for page in pages {
        let master = merged.get_or_insert_with(MasterSchema::default);
        for column in page {
            master.push_if_absent(column);
        }
    }

    merged
}
