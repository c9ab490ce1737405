//! Tests for the HTTP client module

use super::*;
use crate::auth::{current_token, AuthConfig};
use crate::decode::EnvelopeDecoder;
use crate::error::Error;
use crate::types::{BackoffType, ExtractionFlow};
use chrono::NaiveDate;
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_config() -> HttpClientConfig {
    HttpClientConfig::builder()
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(10),
            Duration::from_secs(1),
        )
        .build()
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.max_attempts, 5);
    assert_eq!(config.initial_backoff, Duration::from_millis(1000));
    assert!((config.backoff_factor - 1.5).abs() < f64::EPSILON);
    assert!(config.rate_limit.is_none());
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .timeout(Duration::from_secs(60))
        .max_attempts(3)
        .backoff(
            BackoffType::Linear,
            Duration::from_millis(200),
            Duration::from_secs(30),
        )
        .backoff_factor(2.0)
        .header("X-Custom", "value")
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.max_attempts, 3);
    assert_eq!(config.backoff_type, BackoffType::Linear);
    assert_eq!(config.initial_backoff, Duration::from_millis(200));
    assert_eq!(config.max_backoff, Duration::from_secs(30));
    assert_eq!(
        config.default_headers.get("X-Custom"),
        Some(&"value".to_string())
    );
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[test]
fn test_request_config_builder() {
    let config = RequestConfig::new()
        .query("q", "1")
        .header("X-Request-Id", "abc123")
        .form_field("cmd", "get")
        .timeout(Duration::from_secs(10))
        .attempts(2);

    assert_eq!(config.query.get("q"), Some(&"1".to_string()));
    assert_eq!(config.form, vec![("cmd".to_string(), "get".to_string())]);
    assert_eq!(config.timeout, Some(Duration::from_secs(10)));
    assert_eq!(config.max_attempts, Some(2));
}

// ============================================================================
// Backoff
// ============================================================================

#[test]
fn test_calculate_backoff_exponential_default() {
    let client = HttpClient::new().unwrap();

    assert_eq!(client.calculate_backoff(0), Duration::from_millis(1000));
    assert_eq!(client.calculate_backoff(1), Duration::from_millis(1500));
    assert_eq!(client.calculate_backoff(2), Duration::from_millis(2250));
    assert_eq!(client.calculate_backoff(3), Duration::from_millis(3375));
}

#[test]
fn test_calculate_backoff_constant_and_linear() {
    let constant = HttpClient::with_config(fast_config()).unwrap();
    assert_eq!(constant.calculate_backoff(4), Duration::from_millis(10));

    let linear = HttpClient::with_config(
        HttpClientConfig::builder()
            .backoff(
                BackoffType::Linear,
                Duration::from_millis(100),
                Duration::from_secs(10),
            )
            .build(),
    )
    .unwrap();
    assert_eq!(linear.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(linear.calculate_backoff(2), Duration::from_millis(300));

    let stepped = HttpClient::with_config(
        HttpClientConfig::builder()
            .backoff(
                BackoffType::Linear,
                Duration::from_millis(1000),
                Duration::from_secs(10),
            )
            .backoff_step(Duration::from_millis(250))
            .build(),
    )
    .unwrap();
    assert_eq!(stepped.calculate_backoff(3), Duration::from_millis(1750));
}

#[test]
fn test_calculate_backoff_respects_max() {
    let client = HttpClient::with_config(
        HttpClientConfig::builder()
            .backoff(
                BackoffType::Exponential,
                Duration::from_secs(1),
                Duration::from_secs(5),
            )
            .build(),
    )
    .unwrap();

    assert_eq!(client.calculate_backoff(10), Duration::from_secs(5));
    assert_eq!(client.calculate_backoff(u32::MAX), Duration::from_secs(5));
}

// ============================================================================
// Retry behaviour
// ============================================================================

#[tokio::test]
async fn test_four_failures_then_success_takes_five_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(4)
        .expect(4)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config()).unwrap();
    let body: serde_json::Value = client
        .post_form_json(&format!("{}/api", mock_server.uri()), vec![])
        .await
        .unwrap();

    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_exhausted_attempts_yield_connectivity_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down"))
        .expect(5)
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config()).unwrap();
    let err = client
        .post_form_json::<serde_json::Value>(&mock_server.uri(), vec![])
        .await
        .unwrap_err();

    match err {
        Error::Connectivity { message, attempts } => {
            assert_eq!(attempts, 5);
            assert!(message.contains("503"));
        }
        other => panic!("expected connectivity error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_client_errors_are_retried_too() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config()).unwrap();
    let result = client
        .request_text(Method::GET, &mock_server.uri(), RequestConfig::new().attempts(2))
        .await;

    assert!(matches!(
        result,
        Err(Error::Connectivity { attempts: 2, .. })
    ));
}

#[tokio::test]
async fn test_unparseable_body_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": 42})))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config()).unwrap();
    let body: serde_json::Value = client
        .post_form_json(&mock_server.uri(), vec![])
        .await
        .unwrap();

    assert_eq!(body["value"], 42);
}

#[tokio::test]
async fn test_transport_error_is_connectivity_error() {
    let client = HttpClient::with_config(
        HttpClientConfig::builder()
            .max_attempts(2)
            .backoff(
                BackoffType::Constant,
                Duration::from_millis(1),
                Duration::from_millis(1),
            )
            .build(),
    )
    .unwrap();

    let err = client
        .request_text(Method::GET, "http://127.0.0.1:1/", RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Connectivity { attempts: 2, .. }));
}

// ============================================================================
// Headers & authentication
// ============================================================================

#[tokio::test]
async fn test_auth_headers_applied() {
    let mock_server = MockServer::start().await;
    let token = current_token("s3cret");

    Mock::given(method("POST"))
        .and(header("X-Api-Key", "abc"))
        .and(header("X-Token", token.as_str()))
        .and(header("X-Tenant", "acme"))
        .and(header("X-Default", "yes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth = AuthConfig::new()
        .with_static_header("X-Api-Key", "abc")
        .with_token("X-Token", "s3cret")
        .with_header("X-Tenant", "acme");
    let config = HttpClientConfig::builder()
        .header("X-Default", "yes")
        .max_attempts(1)
        .build();

    let client = HttpClient::with_auth(config, auth).unwrap();
    let _: serde_json::Value = client
        .post_form_json(&mock_server.uri(), vec![])
        .await
        .unwrap();
}

#[test]
fn test_http_client_debug() {
    let client = HttpClient::new().unwrap();
    let debug = format!("{client:?}");
    assert!(debug.contains("HttpClient"));
    assert!(debug.contains("has_authenticator: false"));
    assert!(!client.has_rate_limiter());
}

// ============================================================================
// Page sources
// ============================================================================

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

#[test]
fn test_page_form_paginated() {
    let form = PageForm::new("ORDERS", ExtractionFlow::Paginated, Some(10), today()).unwrap();
    let fields = form.fields(Some(3));

    let expected: Vec<(String, String)> = [
        ("pag", "ORDERS"),
        ("cmd", "get"),
        ("dtde", "05/03/2024"),
        ("dtate", "15/03/2024"),
        ("start", "1"),
        ("page", "3"),
    ]
    .iter()
    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
    .collect();

    pretty_assertions::assert_eq!(fields, expected);
}

#[test]
fn test_page_form_simple_has_no_page_field() {
    let form = PageForm::new("T", ExtractionFlow::Simple, Some(0), today()).unwrap();
    let fields = form.fields(None);

    assert!(fields.contains(&("dtinicio".to_string(), "15/03/2024".to_string())));
    assert!(fields.contains(&("dtfim".to_string(), "15/03/2024".to_string())));
    assert!(!fields.iter().any(|(k, _)| k == "page"));
}

#[test]
fn test_page_form_basic_uses_fixed_from_date() {
    let form = PageForm::new("T", ExtractionFlow::Basic, None, today()).unwrap();
    let fields = form.fields(None);

    assert!(fields.contains(&("a1".to_string(), BASIC_FROM_DATE.to_string())));
    assert!(fields.contains(&("a2".to_string(), "15/03/2024".to_string())));
}

#[test]
fn test_page_form_requires_lookback() {
    let err = PageForm::new("T", ExtractionFlow::Paginated, None, today()).unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));

    assert!(PageForm::new("T", ExtractionFlow::Simple, Some(i64::MAX), today()).is_err());
}

#[tokio::test]
async fn test_api_page_source_fetch_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/data"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("pag=ORDERS"))
        .and(body_string_contains("cmd=get"))
        .and(body_string_contains("page=2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalCount": 4,
            "itens": [{"id": 1}, {"id": 2}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Arc::new(HttpClient::with_config(fast_config()).unwrap());
    let form = PageForm::new("ORDERS", ExtractionFlow::Paginated, Some(1), today()).unwrap();
    let source = ApiPageSource::new(
        client,
        format!("{}/data", mock_server.uri()),
        form,
        EnvelopeDecoder::default(),
    );

    let envelope = source.fetch_page(Some(2)).await.unwrap();
    assert_eq!(envelope.total_count, Some(4));
    assert_eq!(envelope.row_count(), 2);
}

#[tokio::test]
async fn test_api_page_source_envelope_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"totalCount": 1})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Arc::new(HttpClient::with_config(fast_config()).unwrap());
    let form = PageForm::new("T", ExtractionFlow::Basic, None, today()).unwrap();
    let source = ApiPageSource::new(client, mock_server.uri(), form, EnvelopeDecoder::default());

    let err = source.fetch_page(None).await.unwrap_err();
    assert!(matches!(err, Error::Envelope { .. }));
}
