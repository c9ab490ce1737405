//! Schema inference tests

use super::values::{parse_bool, parse_decimal, parse_int, parse_timestamp, truncate_chars};
use super::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

fn column_type(values: &[&str]) -> ColumnType {
    SchemaInferrer::new().infer_column_type(&strings(values))
}

// ============================================================================
// Column type inference
// ============================================================================

#[test_case(&["1", "2", "3"], ColumnType::Int32 ; "small integers")]
#[test_case(&["1", "2", "9999999999"], ColumnType::Int64 ; "integer beyond i32")]
#[test_case(&["-2147483648", "2147483647"], ColumnType::Int32 ; "i32 bounds")]
#[test_case(&["1.5", "2", "-0.25"], ColumnType::Decimal ; "mixed decimals")]
#[test_case(&[".5", "+3."], ColumnType::Decimal ; "loose decimal literals")]
#[test_case(&["true", "FALSE", " True "], ColumnType::Bool ; "booleans any case")]
#[test_case(&["abc", "def"], ColumnType::String ; "plain text")]
#[test_case(&["1e5", "2e3"], ColumnType::String ; "exponent is not a decimal")]
#[test_case(&["NaN", "inf"], ColumnType::String ; "nan and inf are not decimals")]
#[test_case(&[], ColumnType::String ; "no observed values")]
fn test_infer_column_type(values: &[&str], expected: ColumnType) {
    assert_eq!(column_type(values), expected);
}

#[test]
fn test_all_booleans_is_bool() {
    let values: Vec<&str> = (0..20).map(|i| if i % 2 == 0 { "true" } else { "false" }).collect();
    assert_eq!(column_type(&values), ColumnType::Bool);
}

#[test]
fn test_boolean_requires_every_value() {
    let mut values = vec!["true"; 99];
    values.push("maybe");
    assert_eq!(column_type(&values), ColumnType::String);
}

#[test]
fn test_integers_below_threshold_is_string() {
    let mut values: Vec<String> = (0..17).map(|i| i.to_string()).collect();
    values.extend(strings(&["n/a", "unknown", "pending"]));

    let inferrer = SchemaInferrer::with_options(InferenceOptions::new().with_threshold(0.95));
    assert_eq!(inferrer.infer_column_type(&values), ColumnType::String);
}

#[test]
fn test_integers_meeting_threshold() {
    let mut values: Vec<String> = (0..19).map(|i| i.to_string()).collect();
    values.push("n/a".to_string());

    let inferrer = SchemaInferrer::with_options(InferenceOptions::new().with_threshold(0.95));
    assert_eq!(inferrer.infer_column_type(&values), ColumnType::Int32);
}

#[test]
fn test_disabled_candidates() {
    let inferrer = SchemaInferrer::with_options(
        InferenceOptions::new()
            .with_numeric(false)
            .with_booleans(false),
    );
    assert_eq!(
        inferrer.infer_column_type(&strings(&["1", "2"])),
        ColumnType::String
    );
    assert_eq!(
        inferrer.infer_column_type(&strings(&["true", "false"])),
        ColumnType::String
    );
}

#[test]
fn test_timestamps_only_when_enabled() {
    let values = strings(&["2024-01-15T10:30:00Z", "2024-01-16 08:00:00", "15/01/2024"]);

    assert_eq!(
        SchemaInferrer::new().infer_column_type(&values),
        ColumnType::String
    );

    let inferrer = SchemaInferrer::with_options(InferenceOptions::new().with_dates(true));
    assert_eq!(inferrer.infer_column_type(&values), ColumnType::Timestamp);
}

#[test]
fn test_threshold_is_clamped() {
    assert!((InferenceOptions::new().with_threshold(1.7).effective_threshold() - 1.0).abs() < f64::EPSILON);
    assert!(InferenceOptions::new().with_threshold(-3.0).effective_threshold().abs() < f64::EPSILON);
    assert!((InferenceOptions::new().with_threshold(f64::NAN).effective_threshold() - 1.0).abs() < f64::EPSILON);
}

// ============================================================================
// Page inference
// ============================================================================

#[test]
fn test_infer_page_columns_in_first_seen_order() {
    let rows = vec![
        json!({"id": 1, "name": "a"}),
        json!({"id": 2, "price": "9.90", "name": "b"}),
        json!({"id": 3, "active": true, "tags": ["x"]}),
    ];

    let columns = infer_page_schema(&rows, &InferenceOptions::default()).unwrap();
    let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();

    assert_eq!(names, vec!["id", "name", "price", "active", "tags"]);
    assert_eq!(columns[0].column_type, ColumnType::Int32);
    assert!(!columns[0].nullable);
    assert_eq!(columns[1].column_type, ColumnType::String);
    assert!(columns[1].nullable);
    assert_eq!(columns[2].column_type, ColumnType::Decimal);
    assert_eq!(columns[3].column_type, ColumnType::Bool);
    assert_eq!(columns[4].column_type, ColumnType::String);
}

#[test]
fn test_infer_page_null_only_column_is_string() {
    let rows = vec![json!({"id": 1, "note": null}), json!({"id": 2, "note": null})];

    let columns = infer_page_schema(&rows, &InferenceOptions::default()).unwrap();
    assert_eq!(columns[1], ColumnSchema::new("note", ColumnType::String, true));
}

#[test]
fn test_infer_page_without_objects() {
    let options = InferenceOptions::default();
    assert!(infer_page_schema(&[], &options).is_none());
    assert!(infer_page_schema(&[json!(1), json!("x")], &options).is_none());
    assert!(infer_page_schema(&[json!({})], &options).is_none());
}

#[test]
fn test_infer_page_respects_sample_size() {
    let rows = vec![
        json!({"code": 1}),
        json!({"code": 2}),
        json!({"code": "not-a-number", "late": 1}),
    ];

    let options = InferenceOptions::new().with_sample_size(2);
    let columns = infer_page_schema(&rows, &options).unwrap();

    assert_eq!(columns.len(), 1);
    assert_eq!(columns[0].column_type, ColumnType::Int32);
}

// ============================================================================
// Merging
// ============================================================================

#[test]
fn test_merge_union_first_type_wins() {
    let page1 = vec![
        ColumnSchema::new("id", ColumnType::Int32, false),
        ColumnSchema::new("name", ColumnType::String, false),
    ];
    let page2 = vec![
        ColumnSchema::new("id", ColumnType::Int64, true),
        ColumnSchema::new("amount", ColumnType::Decimal, false),
    ];

    let master = merge_page_schemas(vec![page1, page2]).unwrap();
    let names: Vec<_> = master.names().collect();

    assert_eq!(names, vec!["id", "name", "amount"]);
    let id = master.get("id").unwrap();
    assert_eq!(id.column_type, ColumnType::Int32);
    assert!(id.nullable);
}

#[test]
fn test_merge_nothing() {
    assert!(merge_page_schemas(Vec::<Vec<ColumnSchema>>::new()).is_none());
}

#[test]
fn test_master_schema_dedupes_names() {
    let master = MasterSchema::new(vec![
        ColumnSchema::new("a", ColumnType::String, false),
        ColumnSchema::new("a", ColumnType::Bool, false),
    ]);
    assert_eq!(master.len(), 1);
    assert_eq!(master.columns()[0].column_type, ColumnType::String);
}

// ============================================================================
// Value parsers
// ============================================================================

#[test]
fn test_value_parsers() {
    assert_eq!(parse_int(" 42 "), Some(42));
    assert_eq!(parse_int("4.2"), None);
    assert_eq!(parse_decimal(" -12.50 ").as_deref(), Some("-12.50"));
    assert_eq!(parse_decimal("1,5"), None);
    assert_eq!(parse_bool("TRUE"), Some(true));
    assert_eq!(parse_bool("yes"), None);
}

#[test_case("1e-7", "0.0000001" ; "small float")]
#[test_case("-1.5e-3", "-0.0015" ; "negative fraction")]
#[test_case("1.5E3", "1500" ; "upper case exponent")]
#[test_case("1.25e1", "12.5" ; "point inside digits")]
#[test_case("1.5e+20", "150000000000000000000" ; "large float")]
fn test_parse_decimal_expands_exponent(input: &str, expected: &str) {
    assert_eq!(parse_decimal(input).as_deref(), Some(expected));
}

#[test]
fn test_exponent_numbers_count_as_decimal() {
    let amount = json!(0.000_000_1).to_string();
    assert_eq!(amount, "1e-7");
    assert_eq!(
        column_type(&[&amount, "2.50", "3"]),
        ColumnType::Decimal
    );
    assert_eq!(parse_decimal("1e"), None);
}

#[test]
fn test_parse_timestamp_formats() {
    let expected = chrono::NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap();

    assert_eq!(parse_timestamp("2024-01-15T10:30:00Z"), Some(expected));
    assert_eq!(parse_timestamp("2024-01-15T12:30:00+02:00"), Some(expected));
    assert_eq!(parse_timestamp("2024-01-15 10:30:00"), Some(expected));
    assert_eq!(parse_timestamp("15/01/2024 10:30:00"), Some(expected));
    assert!(parse_timestamp("2024-01-15").is_some());
    assert_eq!(parse_timestamp("yesterday"), None);
}

#[test]
fn test_truncate_chars() {
    assert_eq!(truncate_chars("hello", 3), "hel");
    assert_eq!(truncate_chars("héllo", 2), "hé");
    assert_eq!(truncate_chars("short", 500), "short");
    assert_eq!(truncate_chars(&"x".repeat(600), 500).chars().count(), 500);
}
