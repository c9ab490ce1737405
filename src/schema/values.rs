//! Textual value parsers
//!
//! Inference decides a column type by how many sampled values parse under
//! it; normalization uses the same parsers to convert each cell, so a
//! value counted as parseable during sampling converts the same way later.

use crate::types::JsonValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Plain fixed-point literal: optional sign, digits, optional fraction
static DECIMAL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)$").unwrap());

/// Scientific literal as printed for very small or large JSON numbers
static EXPONENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-]?)(\d+\.?\d*|\.\d+)[eE]([+-]?\d{1,3})$").unwrap()
});

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Textual form of a JSON value; `None` for null
///
/// Strings are returned as-is, nested objects and arrays as JSON text.
pub fn stringify(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Parse a trimmed 64-bit integer
pub fn parse_int(s: &str) -> Option<i64> {
    s.trim().parse().ok()
}

/// Match a trimmed decimal literal, returning it in fixed-point form
///
/// Exponent notation such as `1e-7` is expanded to `0.0000001`.
pub fn parse_decimal(s: &str) -> Option<Cow<'_, str>> {
    let trimmed = s.trim();
    if DECIMAL_REGEX.is_match(trimmed) {
        return Some(Cow::Borrowed(trimmed));
    }
    expand_exponent(trimmed).map(Cow::Owned)
}

fn expand_exponent(s: &str) -> Option<String> {
    let caps = EXPONENT_REGEX.captures(s)?;
    let sign = &caps[1];
    let exponent: i64 = caps[3].parse().ok()?;

    let (int_part, frac_part) = caps[2].split_once('.').unwrap_or((&caps[2], ""));
    let digits = format!("{int_part}{frac_part}");
    let point = int_part.len() as i64 + exponent;

    let fixed = if point <= 0 {
        format!("0.{}{digits}", "0".repeat(point.unsigned_abs() as usize))
    } else if point as usize >= digits.len() {
        format!("{digits}{}", "0".repeat(point as usize - digits.len()))
    } else {
        let (whole, fraction) = digits.split_at(point as usize);
        format!("{whole}.{fraction}")
    };
    Some(format!("{sign}{fixed}"))
}

/// Parse `true`/`false`, trimmed and case-insensitive
pub fn parse_bool(s: &str) -> Option<bool> {
    let trimmed = s.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Some(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Parse ISO-8601/RFC 3339 or `dd/MM/yyyy` style timestamps
///
/// Offsets are converted to UTC. A bare date is midnight.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Truncate to at most `limit` characters without splitting a character
pub fn truncate_chars(s: &str, limit: usize) -> &str {
    match s.char_indices().nth(limit) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
