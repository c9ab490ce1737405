//! Tests for envelope decoding

use super::*;
use serde_json::json;

#[test]
fn test_decode_envelope() {
    let decoder = EnvelopeDecoder::default();
    let envelope = decoder
        .decode(json!({
            "totalCount": 12,
            "itens": [{"id": 1}, {"id": 2}]
        }))
        .unwrap();

    assert_eq!(envelope.total_count, Some(12));
    assert_eq!(envelope.row_count(), 2);
    assert_eq!(envelope.require_total_count().unwrap(), 12);
}

#[test]
fn test_decode_custom_property_names() {
    let decoder = EnvelopeDecoder::new("data", "pages");
    let envelope = decoder
        .decode_str(r#"{"pages": "3", "data": [{"a": 1}]}"#)
        .unwrap();

    assert_eq!(envelope.total_count, Some(3));
    assert_eq!(envelope.row_count(), 1);
}

#[test]
fn test_missing_total_count() {
    let decoder = EnvelopeDecoder::default();
    let envelope = decoder.decode(json!({"itens": []})).unwrap();

    assert_eq!(envelope.total_count, None);
    assert!(envelope.require_total_count().is_err());
    assert!(envelope.is_empty());
}

#[test]
fn test_negative_total_count_is_unusable() {
    let decoder = EnvelopeDecoder::default();
    let envelope = decoder
        .decode(json!({"totalCount": -1, "itens": []}))
        .unwrap();
    assert_eq!(envelope.total_count, None);
}

#[test]
fn test_missing_inner_property() {
    let decoder = EnvelopeDecoder::default();
    let err = decoder.decode(json!({"totalCount": 1})).unwrap_err();
    assert!(err.to_string().contains("'itens' is missing"));
}

#[test]
fn test_inner_property_wrong_type() {
    let decoder = EnvelopeDecoder::default();
    let err = decoder
        .decode(json!({"totalCount": 1, "itens": {"id": 1}}))
        .unwrap_err();
    assert!(err.to_string().contains("expected an array"));
}

#[test]
fn test_null_inner_property_is_empty_page() {
    let decoder = EnvelopeDecoder::default();
    let envelope = decoder
        .decode(json!({"totalCount": 0, "itens": null}))
        .unwrap();
    assert!(envelope.is_empty());
}

#[test]
fn test_body_not_an_object() {
    let decoder = EnvelopeDecoder::default();
    assert!(decoder.decode(json!([1, 2, 3])).is_err());
    assert!(decoder.decode_str("not json").is_err());
}

#[test]
fn test_objects_skip_non_object_rows() {
    let decoder = EnvelopeDecoder::default();
    let envelope = decoder
        .decode(json!({"totalCount": 1, "itens": [{"id": 1}, 5, "x", {"id": 2}]}))
        .unwrap();

    assert_eq!(envelope.row_count(), 4);
    assert_eq!(envelope.objects().count(), 2);
}
