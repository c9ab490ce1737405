//! HTTP client module
//!
//! Provides the retried HTTP client and the page sources built on it.
//!
//! # Features
//!
//! - **Automatic Retries**: every failure kind retried with backoff
//! - **Rate Limiting**: optional token bucket using governor
//! - **Backoff Strategies**: Constant, linear, and exponential backoff
//! - **Authentication**: rolling token applied per attempt via the auth module

mod client;
mod rate_limit;
mod source;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use source::{ApiPageSource, PageForm, PageSource, BASIC_FROM_DATE};

#[cfg(test)]
mod tests;
