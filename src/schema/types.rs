//! Schema types

use serde::{Deserialize, Serialize};

/// Relational type inferred for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Int32,
    Int64,
    Decimal,
    Bool,
    Timestamp,
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::String => write!(f, "string"),
            ColumnType::Int32 => write!(f, "int32"),
            ColumnType::Int64 => write!(f, "int64"),
            ColumnType::Decimal => write!(f, "decimal"),
            ColumnType::Bool => write!(f, "bool"),
            ColumnType::Timestamp => write!(f, "timestamp"),
        }
    }
}

/// One inferred column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column name as it appears in the JSON rows
    pub name: String,
    /// Inferred type
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Whether any sampled row lacked a value for this column
    pub nullable: bool,
}

impl ColumnSchema {
    /// Create a column
    pub fn new(name: impl Into<String>, column_type: ColumnType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable,
        }
    }
}

/// Canonical ordered column list agreed on after sampling
///
/// Column names are unique. The order is the order of every normalized
/// page and of the destination table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterSchema {
    columns: Vec<ColumnSchema>,
}

impl MasterSchema {
    /// Build a schema from columns, keeping the first occurrence of each name
    pub fn new(columns: impl IntoIterator<Item = ColumnSchema>) -> Self {
        let mut schema = Self::default();
        for column in columns {
            schema.push_if_absent(column);
        }
        schema
    }

    /// Append a column unless one with the same name exists; returns whether it was added
    pub(crate) fn push_if_absent(&mut self, column: ColumnSchema) -> bool {
        match self.get_mut(&column.name) {
            Some(existing) => {
                existing.nullable |= column.nullable;
                false
            }
            None => {
                self.columns.push(column);
                true
            }
        }
    }

    /// Columns in canonical order
    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    /// Column names in canonical order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Look up a column by name
    pub fn get(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut ColumnSchema> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Knobs for type inference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceOptions {
    /// Try integer and decimal candidates
    pub infer_numeric: bool,
    /// Try the boolean candidate
    pub infer_booleans: bool,
    /// Try the timestamp candidate
    pub infer_dates: bool,
    /// Objects considered per sampled page
    pub sample_size: usize,
    /// Minimum fraction of values that must parse under a candidate
    pub threshold: f64,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            infer_numeric: true,
            infer_booleans: true,
            infer_dates: false,
            sample_size: 10_000,
            threshold: 0.95,
        }
    }
}

impl InferenceOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable/disable numeric inference
    #[must_use]
    pub fn with_numeric(mut self, enabled: bool) -> Self {
        self.infer_numeric = enabled;
        self
    }

    /// Enable/disable boolean inference
    #[must_use]
    pub fn with_booleans(mut self, enabled: bool) -> Self {
        self.infer_booleans = enabled;
        self
    }

    /// Enable/disable timestamp inference
    #[must_use]
    pub fn with_dates(mut self, enabled: bool) -> Self {
        self.infer_dates = enabled;
        self
    }

    /// Set the per-page object sample size
    #[must_use]
    pub fn with_sample_size(mut self, size: usize) -> Self {
        self.sample_size = size;
        self
    }

    /// Set the confidence threshold
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Threshold clamped to `[0, 1]`; NaN counts as 1
    pub fn effective_threshold(&self) -> f64 {
        if self.threshold.is_nan() {
            1.0
        } else {
            self.threshold.clamp(0.0, 1.0)
        }
    }
}
