//! Loader configuration
//!
//! Every field has a default except `database.connection_string`, which must
//! come from the file or from `RESTLOAD_DATABASE` before a job can run.

use crate::database::SinkOptions;
use crate::decode::{EnvelopeDecoder, DEFAULT_INNER_PROPERTY, DEFAULT_TOTAL_COUNT_FIELD};
use crate::engine::JobConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::schema::InferenceOptions;
use crate::types::BackoffType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Environment variable overriding `database.connection_string`
pub const DATABASE_ENV_VAR: &str = "RESTLOAD_DATABASE";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete loader configuration loaded from YAML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Destination database
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Remote API client
    #[serde(default)]
    pub http: HttpConfig,

    /// Job pipeline tuning
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// Response envelope shape
    #[serde(default)]
    pub api: ApiConfig,

    /// Schema inference
    #[serde(default)]
    pub inference: InferenceOptions,
}

impl LoaderConfig {
    /// Load a config file and apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let mut config = Self::from_yaml(&content)?;
        config.apply_env_overrides(std::env::var(DATABASE_ENV_VAR).ok());
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides(std::env::var(DATABASE_ENV_VAR).ok());
        config
    }

    /// Parse a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Apply a database override; empty values are ignored
    pub fn apply_env_overrides(&mut self, database: Option<String>) {
        if let Some(connection_string) = database.filter(|s| !s.trim().is_empty()) {
            debug!("Database connection string overridden from environment");
            self.database.connection_string = connection_string;
        }
    }

    /// HTTP client settings
    pub fn http_client_config(&self) -> HttpClientConfig {
        let http = &self.http;
        let mut builder = HttpClientConfig::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .max_attempts(http.max_attempts)
            .backoff(
                http.backoff_type,
                Duration::from_millis(http.initial_backoff_ms),
                Duration::from_millis(http.max_backoff_ms),
            )
            .backoff_factor(http.backoff_factor)
            .backoff_step(Duration::from_millis(http.backoff_step_ms));

        if let Some(ref rate_limit) = http.rate_limit {
            builder = builder.rate_limit(rate_limit.clone());
        }

        if let Some(ref agent) = http.user_agent {
            builder = builder.user_agent(agent.clone());
        }

        builder.build()
    }

    /// Job pipeline settings
    pub fn job_config(&self) -> JobConfig {
        let processing = &self.processing;
        JobConfig::new()
            .with_concurrency(processing.concurrency)
            .with_queue_capacity(processing.queue_capacity)
            .with_page_delay(Duration::from_millis(processing.page_delay_ms))
            .with_progress_interval(Duration::from_secs(processing.progress_interval_secs))
            .with_sample_page_cap(processing.sample_page_cap)
            .with_sample_concurrency(processing.sample_concurrency)
            .with_insert_retry(
                self.database.insert_attempts,
                Duration::from_millis(self.database.insert_retry_delay_ms),
            )
            .with_field_char_limit(self.database.field_char_limit)
            .with_inference(self.inference.clone())
    }

    /// Configured database location
    ///
    /// Fails when no non-blank connection string was given; `:memory:` must be
    /// set explicitly.
    pub fn database_location(&self) -> Result<&str> {
        let connection_string = self.database.connection_string.trim();
        if connection_string.is_empty() {
            return Err(Error::config(format!(
                "database.connection_string is required; set it in the config file or via {DATABASE_ENV_VAR}"
            )));
        }
        Ok(connection_string)
    }

    /// Sink settings
    pub fn sink_options(&self) -> SinkOptions {
        SinkOptions {
            field_char_limit: self.database.field_char_limit,
            batch_size: self.database.batch_size,
        }
    }

    /// Envelope decoder
    pub fn decoder(&self) -> EnvelopeDecoder {
        EnvelopeDecoder::new(&self.api.inner_property, &self.api.total_count_field)
    }
}

// ============================================================================
// Database
// ============================================================================

/// Destination database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// DuckDB file path, or `:memory:` for a throwaway database
    #[serde(default)]
    pub connection_string: String,

    /// Character cap for string columns
    #[serde(default = "default_field_char_limit")]
    pub field_char_limit: usize,

    /// Rows appended between flushes
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Attempts per page insert
    #[serde(default = "default_insert_attempts")]
    pub insert_attempts: u32,

    /// Base delay between insert attempts in milliseconds
    #[serde(default = "default_insert_retry_delay_ms")]
    pub insert_retry_delay_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            connection_string: String::new(),
            field_char_limit: default_field_char_limit(),
            batch_size: default_batch_size(),
            insert_attempts: default_insert_attempts(),
            insert_retry_delay_ms: default_insert_retry_delay_ms(),
        }
    }
}

fn default_field_char_limit() -> usize {
    500
}

fn default_batch_size() -> usize {
    10_000
}

fn default_insert_attempts() -> u32 {
    3
}

fn default_insert_retry_delay_ms() -> u64 {
    500
}

// ============================================================================
// HTTP
// ============================================================================

/// Remote API client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Attempts per request, first one included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay after the first failure in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Exponential growth factor
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Linear increment in milliseconds
    #[serde(default = "default_backoff_step_ms")]
    pub backoff_step_ms: u64,

    /// Backoff strategy
    #[serde(default)]
    pub backoff_type: BackoffType,

    /// Backoff ceiling in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Client-side rate limit, off when absent
    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            backoff_factor: default_backoff_factor(),
            backoff_step_ms: default_backoff_step_ms(),
            backoff_type: BackoffType::Exponential,
            max_backoff_ms: default_max_backoff_ms(),
            user_agent: None,
            rate_limit: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_backoff_ms() -> u64 {
    1000
}

fn default_backoff_factor() -> f64 {
    1.5
}

fn default_backoff_step_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    60_000
}

// ============================================================================
// Processing
// ============================================================================

/// Job pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Pages loaded concurrently
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Writer queue capacity, 0 for twice the concurrency
    #[serde(default)]
    pub queue_capacity: usize,

    /// Pause after each page fetch in milliseconds
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Progress log interval in seconds
    #[serde(default = "default_progress_interval_secs")]
    pub progress_interval_secs: u64,

    /// Pages sampled for inference
    #[serde(default = "default_sample_page_cap")]
    pub sample_page_cap: u32,

    /// Concurrent fetches while sampling
    #[serde(default = "default_sample_concurrency")]
    pub sample_concurrency: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            queue_capacity: 0,
            page_delay_ms: default_page_delay_ms(),
            progress_interval_secs: default_progress_interval_secs(),
            sample_page_cap: default_sample_page_cap(),
            sample_concurrency: default_sample_concurrency(),
        }
    }
}

fn default_concurrency() -> usize {
    4
}

fn default_page_delay_ms() -> u64 {
    1000
}

fn default_progress_interval_secs() -> u64 {
    10
}

fn default_sample_page_cap() -> u32 {
    crate::pagination::DEFAULT_SAMPLE_PAGE_CAP
}

fn default_sample_concurrency() -> usize {
    10
}

// ============================================================================
// API envelope
// ============================================================================

/// Response envelope field names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Property holding the row array
    #[serde(default = "default_inner_property")]
    pub inner_property: String,

    /// Property holding the total page count
    #[serde(default = "default_total_count_field")]
    pub total_count_field: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            inner_property: default_inner_property(),
            total_count_field: default_total_count_field(),
        }
    }
}

fn default_inner_property() -> String {
    DEFAULT_INNER_PROPERTY.to_string()
}

fn default_total_count_field() -> String {
    DEFAULT_TOTAL_COUNT_FIELD.to_string()
}
