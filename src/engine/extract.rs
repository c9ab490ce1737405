//! Entry point turning an [`ExtractionRequest`] into a running job

use super::controller::JobController;
use super::types::{ExtractionRequest, ExtractionResult, JobConfig};
use crate::database::{RelationalSink, TableRef};
use crate::decode::EnvelopeDecoder;
use crate::error::{Error, Result};
use crate::http::{ApiPageSource, HttpClient, HttpClientConfig, PageForm};
use crate::types::ExtractionFlow;
use chrono::{Local, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use url::Url;
use uuid::Uuid;

/// Builds and runs extraction jobs against one sink
pub struct Extractor {
    http: HttpClientConfig,
    decoder: EnvelopeDecoder,
    job: JobConfig,
    sink: Arc<dyn RelationalSink>,
}

impl Extractor {
    /// Create an extractor with default HTTP, envelope and job settings
    pub fn new(sink: Arc<dyn RelationalSink>) -> Self {
        Self {
            http: HttpClientConfig::default(),
            decoder: EnvelopeDecoder::default(),
            job: JobConfig::default(),
            sink,
        }
    }

    #[must_use]
    pub fn with_http_config(mut self, http: HttpClientConfig) -> Self {
        self.http = http;
        self
    }

    #[must_use]
    pub fn with_decoder(mut self, decoder: EnvelopeDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    #[must_use]
    pub fn with_job_config(mut self, job: JobConfig) -> Self {
        self.job = job;
        self
    }

    /// Run one request with the given flow
    ///
    /// Invalid requests are rejected before any network call and come back
    /// as a failed result.
    pub async fn extract(
        &self,
        request: &ExtractionRequest,
        flow: ExtractionFlow,
        cancel: CancellationToken,
    ) -> ExtractionResult {
        let start_time = Utc::now();

        let controller = match self.controller(request, flow, cancel) {
            Ok(controller) => controller,
            Err(e) => {
                error!(
                    "Rejected {} extraction for {}.{}: {}",
                    flow, request.sys_name, request.destination_table_name, e
                );
                return ExtractionResult::failure(Uuid::new_v4(), start_time, &e);
            }
        };

        info!("Starting {} extraction into {}", flow, controller.table());
        match flow {
            ExtractionFlow::Paginated => controller.run().await,
            ExtractionFlow::Simple | ExtractionFlow::Basic => controller.run_single().await,
        }
    }

    /// Page-by-page extraction
    pub async fn run_paginated(
        &self,
        request: &ExtractionRequest,
        cancel: CancellationToken,
    ) -> ExtractionResult {
        self.extract(request, ExtractionFlow::Paginated, cancel).await
    }

    /// Single date-filtered extraction
    pub async fn run_simple(
        &self,
        request: &ExtractionRequest,
        cancel: CancellationToken,
    ) -> ExtractionResult {
        self.extract(request, ExtractionFlow::Simple, cancel).await
    }

    /// Single full-history extraction
    pub async fn run_basic(
        &self,
        request: &ExtractionRequest,
        cancel: CancellationToken,
    ) -> ExtractionResult {
        self.extract(request, ExtractionFlow::Basic, cancel).await
    }

    fn controller(
        &self,
        request: &ExtractionRequest,
        flow: ExtractionFlow,
        cancel: CancellationToken,
    ) -> Result<JobController> {
        let lookback = request.validate(flow)?;
        let url = parse_endpoint(&request.connection_info.url)?;
        let table = TableRef::new(&request.sys_name, &request.destination_table_name)?;

        let form = PageForm::new(
            request.destination_table_name.trim(),
            flow,
            lookback,
            Local::now().date_naive(),
        )?;
        let client = HttpClient::with_auth(self.http.clone(), request.auth_config())?;
        let source = ApiPageSource::new(Arc::new(client), url, form, self.decoder.clone());

        Ok(
            JobController::new(Arc::new(source), Arc::clone(&self.sink), table)
                .with_config(self.job.clone())
                .with_cancellation(cancel),
        )
    }
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("http", &self.http)
            .field("decoder", &self.decoder)
            .field("job", &self.job)
            .finish_non_exhaustive()
    }
}

fn parse_endpoint(raw: &str) -> Result<String> {
    let url = Url::parse(raw.trim())
        .map_err(|e| Error::validation(format!("invalid connectionInfo.url '{raw}': {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url.into()),
        other => Err(Error::validation(format!(
            "connectionInfo.url must be http or https, got '{other}'"
        ))),
    }
}
