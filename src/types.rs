//! Common types used throughout restload
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Generic key-value map with string keys and values
pub type StringMap = HashMap<String, String>;

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Fixed increment added per failed attempt
    Linear,
    /// Delay multiplied by the backoff factor per failed attempt
    #[default]
    Exponential,
}

// ============================================================================
// Extraction Flow
// ============================================================================

/// Shape of an extraction against the remote API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionFlow {
    /// Page-by-page extraction driven by the envelope's total count
    #[default]
    Paginated,
    /// A single date-filtered request
    Simple,
    /// A single request over the full history, no lookback
    Basic,
}

impl ExtractionFlow {
    /// Form field names carrying the (from, to) dates for this flow
    pub fn date_fields(self) -> (&'static str, &'static str) {
        match self {
            ExtractionFlow::Paginated => ("dtde", "dtate"),
            ExtractionFlow::Simple => ("dtinicio", "dtfim"),
            ExtractionFlow::Basic => ("a1", "a2"),
        }
    }

    /// Whether the flow requires a numeric lookback in `options[4]`
    pub fn needs_lookback(self) -> bool {
        !matches!(self, ExtractionFlow::Basic)
    }
}

impl std::fmt::Display for ExtractionFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionFlow::Paginated => write!(f, "paginated"),
            ExtractionFlow::Simple => write!(f, "simple"),
            ExtractionFlow::Basic => write!(f, "basic"),
        }
    }
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_default() {
        assert_eq!(BackoffType::default(), BackoffType::Exponential);
    }

    #[test]
    fn test_flow_serde() {
        let flow: ExtractionFlow = serde_json::from_str("\"simple\"").unwrap();
        assert_eq!(flow, ExtractionFlow::Simple);

        let json = serde_json::to_string(&ExtractionFlow::Paginated).unwrap();
        assert_eq!(json, "\"paginated\"");
    }

    #[test]
    fn test_flow_date_fields() {
        assert_eq!(ExtractionFlow::Paginated.date_fields(), ("dtde", "dtate"));
        assert_eq!(ExtractionFlow::Simple.date_fields(), ("dtinicio", "dtfim"));
        assert_eq!(ExtractionFlow::Basic.date_fields(), ("a1", "a2"));
        assert!(!ExtractionFlow::Basic.needs_lookback());
        assert!(ExtractionFlow::Simple.needs_lookback());
    }

    #[test]
    fn test_option_string_none_if_empty() {
        assert_eq!(
            Some("test".to_string()).none_if_empty(),
            Some("test".to_string())
        );
        assert_eq!(Some(String::new()).none_if_empty(), None);
        assert_eq!(None::<String>.none_if_empty(), None);
    }
}
