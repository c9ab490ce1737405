//! Engine types: inbound request, job configuration and results

use crate::auth::AuthConfig;
use crate::error::{Error, Result};
use crate::schema::InferenceOptions;
use crate::types::{ExtractionFlow, OptionStringExt, StringMap};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Minimum number of entries in [`ExtractionRequest::options`]
pub const MIN_OPTIONS: usize = 5;

// ============================================================================
// Request
// ============================================================================

/// Remote API location and credentials
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    /// Endpoint receiving the form POST
    pub url: String,
    /// Basic auth user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Basic auth password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Extra headers sent with every call
    #[serde(default, skip_serializing_if = "StringMap::is_empty")]
    pub headers: StringMap,
}

/// One extraction job as submitted by the caller
///
/// `options` slots: `[0]` auth header name, `[1]` auth header value,
/// `[2]` token header name, `[3]` token secret, `[4]` lookback days.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRequest {
    /// Positional options
    pub options: Vec<String>,
    /// Destination table, also sent to the API as `pag`
    pub destination_table_name: String,
    /// Destination namespace
    pub sys_name: String,
    /// Remote API connection
    pub connection_info: ConnectionInfo,
}

impl ExtractionRequest {
    /// Check the request shape for the given flow, returning the lookback in days
    pub fn validate(&self, flow: ExtractionFlow) -> Result<Option<i64>> {
        if self.options.len() < MIN_OPTIONS {
            return Err(Error::validation(format!(
                "expected at least {MIN_OPTIONS} options, got {}",
                self.options.len()
            )));
        }

        if self.connection_info.url.trim().is_empty() {
            return Err(Error::validation("connectionInfo.url is empty"));
        }

        if !flow.needs_lookback() {
            return Ok(None);
        }

        let raw = self.options[4].trim();
        raw.parse::<i64>().map(Some).map_err(|_| {
            Error::validation(format!("options[4] must be an integer lookback, got '{raw}'"))
        })
    }

    /// Authentication derived from the options and connection info
    pub fn auth_config(&self) -> AuthConfig {
        let option = |index: usize| self.options.get(index).map(String::as_str).unwrap_or("");

        let mut auth = AuthConfig::new();

        if !option(0).is_empty() {
            auth = auth.with_static_header(option(0), option(1));
        }

        if !option(2).is_empty() {
            auth = auth.with_token(option(2), option(3));
        }

        for (name, value) in &self.connection_info.headers {
            auth = auth.with_header(name, value);
        }

        if let Some(username) = self.connection_info.username.clone().none_if_empty() {
            auth = auth.with_basic(username, self.connection_info.password.clone());
        }

        auth
    }
}

// ============================================================================
// Job configuration
// ============================================================================

/// Tuning for one extraction job
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Pages fetched concurrently during loading
    pub concurrency: usize,
    /// Normalized pages buffered for the writer (0 = twice the concurrency)
    pub queue_capacity: usize,
    /// Pause after each page fetch, held inside the concurrency permit
    pub page_delay: Duration,
    /// How often loading progress is logged
    pub progress_interval: Duration,
    /// Upper bound on pages sampled for inference
    pub sample_page_cap: u32,
    /// Pages fetched concurrently while sampling
    pub sample_concurrency: usize,
    /// Attempts per page insert
    pub insert_attempts: u32,
    /// Delay before insert retry, multiplied by the attempt number
    pub insert_retry_delay: Duration,
    /// Character cap for string columns
    pub field_char_limit: usize,
    /// Schema inference options
    pub inference: InferenceOptions,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            queue_capacity: 0,
            page_delay: Duration::from_millis(1000),
            progress_interval: Duration::from_secs(10),
            sample_page_cap: crate::pagination::DEFAULT_SAMPLE_PAGE_CAP,
            sample_concurrency: 10,
            insert_attempts: 3,
            insert_retry_delay: Duration::from_millis(500),
            field_char_limit: 500,
            inference: InferenceOptions::default(),
        }
    }
}

impl JobConfig {
    /// Create a job config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the loading concurrency
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the writer queue capacity
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the per-page politeness delay
    #[must_use]
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Set the progress log interval
    #[must_use]
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Set the sampling cap
    #[must_use]
    pub fn with_sample_page_cap(mut self, cap: u32) -> Self {
        self.sample_page_cap = cap;
        self
    }

    /// Set the sampling concurrency
    #[must_use]
    pub fn with_sample_concurrency(mut self, concurrency: usize) -> Self {
        self.sample_concurrency = concurrency;
        self
    }

    /// Set insert retry behavior
    #[must_use]
    pub fn with_insert_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.insert_attempts = attempts;
        self.insert_retry_delay = delay;
        self
    }

    /// Set the string column cap
    #[must_use]
    pub fn with_field_char_limit(mut self, limit: usize) -> Self {
        self.field_char_limit = limit;
        self
    }

    /// Set inference options
    #[must_use]
    pub fn with_inference(mut self, inference: InferenceOptions) -> Self {
        self.inference = inference;
        self
    }

    /// Concurrency with a floor of one
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }

    /// Writer queue capacity with the default applied
    pub fn effective_queue_capacity(&self) -> usize {
        if self.queue_capacity == 0 {
            self.effective_concurrency() * 2
        } else {
            self.queue_capacity
        }
    }
}

// ============================================================================
// Phases and results
// ============================================================================

/// Job state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Probing,
    Sampling,
    TableEnsure,
    Loading,
    Completed,
    Failed,
}

impl std::fmt::Display for JobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobPhase::Probing => write!(f, "probing"),
            JobPhase::Sampling => write!(f, "sampling"),
            JobPhase::TableEnsure => write!(f, "table_ensure"),
            JobPhase::Loading => write!(f, "loading"),
            JobPhase::Completed => write!(f, "completed"),
            JobPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Final classification of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome {
    Success,
    PartialSuccess,
    Failed,
    Cancelled,
}

/// Outcome of one page during loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
    /// 1-based page number
    pub page: u32,
    /// Whether the page was fetched and inserted
    pub success: bool,
    /// Rows inserted
    pub row_count: usize,
    /// Failure description
    pub error: Option<String>,
}

impl PageResult {
    /// A loaded page
    pub fn ok(page: u32, row_count: usize) -> Self {
        Self {
            page,
            success: true,
            row_count,
            error: None,
        }
    }

    /// A failed page
    pub fn failed(page: u32, error: impl Into<String>) -> Self {
        Self {
            page,
            success: false,
            row_count: 0,
            error: Some(error.into()),
        }
    }
}

/// Structured result returned for every job, including failed ones
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    /// True only when no page failed
    pub success: bool,
    /// Outcome classification
    pub outcome: JobOutcome,
    /// Human readable summary
    pub message: String,
    /// Rows inserted
    pub records_processed: u64,
    /// Pages fetched and inserted
    pub pages_processed: u32,
    /// Pages reported by the API
    pub total_pages: u32,
    /// Failed pages
    pub error_count: u32,
    /// Pages never attempted because of cancellation
    pub skipped_pages: u32,
    /// Job start (UTC)
    pub start_time: DateTime<Utc>,
    /// Job end (UTC)
    pub end_time: DateTime<Utc>,
    /// Job identifier
    pub job_id: Uuid,
    /// Per-page failures
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ExtractionResult {
    /// A job that stopped before loading
    pub fn failure(job_id: Uuid, start_time: DateTime<Utc>, error: &Error) -> Self {
        Self {
            success: false,
            outcome: JobOutcome::Failed,
            message: error.to_string(),
            records_processed: 0,
            pages_processed: 0,
            total_pages: 0,
            error_count: 0,
            skipped_pages: 0,
            start_time,
            end_time: Utc::now(),
            job_id,
            errors: Vec::new(),
        }
    }

    /// A job with nothing to load
    pub fn empty(job_id: Uuid, start_time: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            outcome: JobOutcome::Success,
            message: message.into(),
            records_processed: 0,
            pages_processed: 0,
            total_pages: 0,
            error_count: 0,
            skipped_pages: 0,
            start_time,
            end_time: Utc::now(),
            job_id,
            errors: Vec::new(),
        }
    }

    /// Reduce per-page results into a job result
    ///
    /// `total_pages` includes pages never attempted; those count as skipped.
    pub fn from_pages(
        job_id: Uuid,
        start_time: DateTime<Utc>,
        total_pages: u32,
        pages: &[PageResult],
        cancelled: bool,
    ) -> Self {
        let mut records_processed = 0u64;
        let mut pages_processed = 0u32;
        let mut errors = Vec::new();

        for page in pages {
            if page.success {
                pages_processed += 1;
                records_processed += page.row_count as u64;
            } else {
                errors.push(format!(
                    "page {}: {}",
                    page.page,
                    page.error.as_deref().unwrap_or("unknown error")
                ));
            }
        }

        let error_count = errors.len() as u32;
        let skipped_pages = total_pages.saturating_sub(pages.len() as u32);

        let outcome = if cancelled && skipped_pages > 0 {
            JobOutcome::Cancelled
        } else if error_count == 0 {
            JobOutcome::Success
        } else if error_count < total_pages {
            JobOutcome::PartialSuccess
        } else {
            JobOutcome::Failed
        };

        let success = error_count == 0 && outcome != JobOutcome::Cancelled;

        let message = match outcome {
            JobOutcome::Success => format!(
                "Loaded {records_processed} records from {pages_processed} pages"
            ),
            JobOutcome::PartialSuccess => format!(
                "Loaded {records_processed} records from {pages_processed} of {total_pages} pages, {error_count} failed"
            ),
            JobOutcome::Failed => format!("All {total_pages} pages failed"),
            JobOutcome::Cancelled => format!(
                "Cancelled after {pages_processed} of {total_pages} pages, {skipped_pages} skipped, {error_count} failed"
            ),
        };

        Self {
            success,
            outcome,
            message,
            records_processed,
            pages_processed,
            total_pages,
            error_count,
            skipped_pages,
            start_time,
            end_time: Utc::now(),
            job_id,
            errors,
        }
    }
}
