//! Envelope types and decoder

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};

/// Default name of the inner row array
pub const DEFAULT_INNER_PROPERTY: &str = "itens";

/// Default name of the total page count field
pub const DEFAULT_TOTAL_COUNT_FIELD: &str = "totalCount";

/// One decoded page of the remote API
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    /// Total page count announced by the API, when present
    pub total_count: Option<u64>,
    /// Raw row values from the inner array
    pub rows: Vec<JsonValue>,
}

impl Envelope {
    /// Total page count, or an error when the envelope did not carry one
    pub fn require_total_count(&self) -> Result<u64> {
        self.total_count
            .ok_or_else(|| Error::envelope("response carries no usable total count"))
    }

    /// Rows that are JSON objects; other array elements are ignored
    pub fn objects(&self) -> impl Iterator<Item = &JsonObject> {
        self.rows.iter().filter_map(JsonValue::as_object)
    }

    /// Number of raw rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether the page carried no rows at all
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Decodes JSON bodies into [`Envelope`]s
#[derive(Debug, Clone)]
pub struct EnvelopeDecoder {
    inner_property: String,
    total_count_field: String,
}

impl Default for EnvelopeDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_INNER_PROPERTY, DEFAULT_TOTAL_COUNT_FIELD)
    }
}

impl EnvelopeDecoder {
    /// Create a decoder for the given property names
    pub fn new(inner_property: impl Into<String>, total_count_field: impl Into<String>) -> Self {
        Self {
            inner_property: inner_property.into(),
            total_count_field: total_count_field.into(),
        }
    }

    /// Name of the inner row array
    pub fn inner_property(&self) -> &str {
        &self.inner_property
    }

    /// Decode a raw response body
    pub fn decode_str(&self, body: &str) -> Result<Envelope> {
        let value: JsonValue = serde_json::from_str(body)
            .map_err(|e| Error::envelope(format!("body is not valid JSON: {e}")))?;
        self.decode(value)
    }

    /// Decode an already parsed response body
    pub fn decode(&self, value: JsonValue) -> Result<Envelope> {
        let JsonValue::Object(mut map) = value else {
            return Err(Error::envelope(format!(
                "expected a JSON object, got {}",
                kind_of(&value)
            )));
        };

        let total_count = map.get(&self.total_count_field).and_then(parse_count);

        let rows = match map.remove(&self.inner_property) {
            Some(JsonValue::Array(rows)) => rows,
            Some(JsonValue::Null) => Vec::new(),
            Some(other) => {
                return Err(Error::envelope(format!(
                    "property '{}' is {}, expected an array",
                    self.inner_property,
                    kind_of(&other)
                )))
            }
            None => {
                return Err(Error::envelope(format!(
                    "property '{}' is missing",
                    self.inner_property
                )))
            }
        };

        Ok(Envelope { total_count, rows })
    }
}

/// Accept non-negative integers, integral floats and numeric strings
fn parse_count(value: &JsonValue) -> Option<u64> {
    match value {
        JsonValue::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn kind_of(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
