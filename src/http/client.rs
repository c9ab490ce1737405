//! HTTP client with retry and backoff
//!
//! Every failure kind is retried: transport errors, non-success statuses
//! and bodies that cannot be read or parsed. When attempts run out the
//! caller gets [`Error::Connectivity`] carrying the last failure.

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::auth::{AuthConfig, Authenticator};
use crate::error::{Error, Result};
use crate::types::{BackoffType, StringMap};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Total number of attempts per request, first one included
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub initial_backoff: Duration,
    /// Growth factor applied per failed attempt (exponential backoff)
    pub backoff_factor: f64,
    /// Increment added per failed attempt (linear backoff)
    pub backoff_step: Duration,
    /// Maximum delay for backoff
    pub max_backoff: Duration,
    /// Type of backoff strategy
    pub backoff_type: BackoffType,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// Default headers for all requests
    pub default_headers: StringMap,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 5,
            initial_backoff: Duration::from_millis(1000),
            backoff_factor: 1.5,
            backoff_step: Duration::from_millis(100),
            max_backoff: Duration::from_secs(60),
            backoff_type: BackoffType::Exponential,
            rate_limit: None,
            default_headers: StringMap::new(),
            user_agent: format!("restload/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the total number of attempts
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    /// Set backoff configuration
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.backoff_type = backoff_type;
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    /// Set the exponential growth factor
    pub fn backoff_factor(mut self, factor: f64) -> Self {
        self.config.backoff_factor = factor;
        self
    }

    /// Set the linear increment
    pub fn backoff_step(mut self, step: Duration) -> Self {
        self.config.backoff_step = step;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters
    pub query: StringMap,
    /// Request headers
    pub headers: StringMap,
    /// Form-encoded body fields, sent in order
    pub form: Vec<(String, String)>,
    /// Override timeout for this request
    pub timeout: Option<Duration>,
    /// Override attempt count for this request
    pub max_attempts: Option<u32>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Append a form field
    #[must_use]
    pub fn form_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((key.into(), value.into()));
        self
    }

    /// Replace the form body
    #[must_use]
    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.form = fields;
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set attempt count
    #[must_use]
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }
}

/// HTTP client with retry and optional rate limiting
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    authenticator: Option<Authenticator>,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            authenticator: None,
            rate_limiter,
        })
    }

    /// Create a client with authentication
    pub fn with_auth(config: HttpClientConfig, auth_config: AuthConfig) -> Result<Self> {
        let mut client = Self::with_config(config)?;
        client.authenticator = Some(Authenticator::new(auth_config));
        Ok(client)
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Make a request and return the response body as text
    pub async fn request_text(
        &self,
        method: Method,
        url: &str,
        config: RequestConfig,
    ) -> Result<String> {
        self.request_with(method, url, &config, Ok).await
    }

    /// Make a request and parse the JSON response body
    ///
    /// A body that fails to parse counts as a failed attempt.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        config: RequestConfig,
    ) -> Result<T> {
        self.request_with(method, url, &config, |body| {
            serde_json::from_str(&body).map_err(Error::from)
        })
        .await
    }

    /// Make a POST request with a form body and parse the JSON response
    pub async fn post_form_json<T: DeserializeOwned>(
        &self,
        url: &str,
        fields: Vec<(String, String)>,
    ) -> Result<T> {
        self.request_json(Method::POST, url, RequestConfig::new().form(fields))
            .await
    }

    /// Retry loop shared by every request flavour
    async fn request_with<T, F>(
        &self,
        method: Method,
        url: &str,
        config: &RequestConfig,
        parse: F,
    ) -> Result<T>
    where
        F: Fn(String) -> Result<T>,
    {
        let max_attempts = config
            .max_attempts
            .unwrap_or(self.config.max_attempts)
            .max(1);
        let timeout = config.timeout.unwrap_or(self.config.timeout);

        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }

            let mut req = self.client.request(method.clone(), url);

            for (key, value) in &self.config.default_headers {
                req = req.header(key.as_str(), value.as_str());
            }

            for (key, value) in &config.headers {
                req = req.header(key.as_str(), value.as_str());
            }

            if !config.query.is_empty() {
                req = req.query(&config.query);
            }

            if !config.form.is_empty() {
                req = req.form(&config.form);
            }

            req = req.timeout(timeout);

            // Token is recomputed per attempt so a retry after midnight uses the new date
            if let Some(ref auth) = self.authenticator {
                req = auth.apply(req);
            }

            let outcome = match req.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        match response.text().await {
                            Ok(body) => parse(body),
                            Err(e) => Err(Error::Http(e)),
                        }
                    } else {
                        let body = response.text().await.unwrap_or_default();
                        Err(Error::http_status(status.as_u16(), body))
                    }
                }
                Err(e) => Err(Error::Http(e)),
            };

            match outcome {
                Ok(value) => {
                    debug!("Request succeeded: {} {} (attempt {})", method, url, attempt);
                    return Ok(value);
                }
                Err(e) => {
                    last_error = e.to_string();
                    if attempt < max_attempts {
                        let delay = self.calculate_backoff(attempt - 1);
                        warn!(
                            "Request failed: {}, attempt {}/{}, retrying in {:?}",
                            last_error, attempt, max_attempts, delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        warn!(
            "Request to {} failed after {} attempts: {}",
            url, max_attempts, last_error
        );
        Err(Error::connectivity(last_error, max_attempts))
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Calculate the delay after the given failed attempt (0-based)
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let initial = self.config.initial_backoff;
        let delay = match self.config.backoff_type {
            BackoffType::Constant => initial,
            BackoffType::Linear => {
                initial.saturating_add(self.config.backoff_step.saturating_mul(attempt))
            }
            BackoffType::Exponential => {
                let factor = self.config.backoff_factor.max(1.0).powi(attempt.min(1024) as i32);
                let secs = initial.as_secs_f64() * factor;
                if secs.is_finite() && secs < self.config.max_backoff.as_secs_f64() {
                    Duration::from_secs_f64(secs)
                } else {
                    self.config.max_backoff
                }
            }
        };

        std::cmp::min(delay, self.config.max_backoff)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_authenticator", &self.authenticator.is_some())
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}
