//! Job controller: probe, sample, ensure table, load

use super::types::{ExtractionResult, JobConfig, JobPhase, PageResult};
use crate::database::{RelationalSink, TableRef};
use crate::decode::Envelope;
use crate::error::{Error, Result};
use crate::http::PageSource;
use crate::normalize::{NormalizedPage, Normalizer};
use crate::pagination::{all_pages, sample_pages};
use crate::schema::{infer_page_schema, merge_page_schemas, ColumnSchema, MasterSchema};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Runs one extraction job against a page source and a sink
pub struct JobController {
    source: Arc<dyn PageSource>,
    sink: Arc<dyn RelationalSink>,
    table: TableRef,
    config: JobConfig,
    cancel: CancellationToken,
}

impl JobController {
    /// Create a controller with default job configuration
    pub fn new(source: Arc<dyn PageSource>, sink: Arc<dyn RelationalSink>, table: TableRef) -> Self {
        Self {
            source,
            sink,
            table,
            config: JobConfig::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Set job configuration
    #[must_use]
    pub fn with_config(mut self, config: JobConfig) -> Self {
        self.config = config;
        self
    }

    /// Use an external cancellation token
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops the job from starting new pages
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Destination table
    pub fn table(&self) -> &TableRef {
        &self.table
    }

    /// Run a paginated job
    ///
    /// Always returns a result; errors before loading yield a failed one.
    pub async fn run(&self) -> ExtractionResult {
        let job_id = Uuid::new_v4();
        let start_time = Utc::now();
        let mut tracker = PhaseTracker::new(job_id, &self.table);

        let result = match self.run_paginated(job_id, start_time, &mut tracker).await {
            Ok(result) => result,
            Err(e) => {
                tracker.fail(&e);
                return ExtractionResult::failure(job_id, start_time, &e);
            }
        };

        tracker.finish(&result);
        result
    }

    /// Run a single unpaginated request
    pub async fn run_single(&self) -> ExtractionResult {
        let job_id = Uuid::new_v4();
        let start_time = Utc::now();
        let mut tracker = PhaseTracker::new(job_id, &self.table);

        let result = match self.run_unpaginated(job_id, start_time, &mut tracker).await {
            Ok(result) => result,
            Err(e) => {
                tracker.fail(&e);
                return ExtractionResult::failure(job_id, start_time, &e);
            }
        };

        tracker.finish(&result);
        result
    }

    async fn run_paginated(
        &self,
        job_id: Uuid,
        start_time: DateTime<Utc>,
        tracker: &mut PhaseTracker,
    ) -> Result<ExtractionResult> {
        let probe = self.source.fetch_page(Some(1)).await?;
        let total_count = probe.require_total_count()?;
        let total_pages = u32::try_from(total_count)
            .map_err(|_| Error::envelope(format!("totalCount {total_count} is out of range")))?;

        if total_pages == 0 {
            return Ok(ExtractionResult::empty(
                job_id,
                start_time,
                "API reported no pages",
            ));
        }
        info!("API reports {} pages for {}", total_pages, self.table);

        tracker.enter(JobPhase::Sampling);
        let schema = match self.sample_schema(total_pages, probe).await? {
            Some(schema) if !self.cancel.is_cancelled() => Arc::new(schema),
            _ => {
                return Ok(ExtractionResult::from_pages(
                    job_id,
                    start_time,
                    total_pages,
                    &[],
                    true,
                ))
            }
        };

        tracker.enter(JobPhase::TableEnsure);
        self.ensure_table(Arc::clone(&schema)).await?;

        tracker.enter(JobPhase::Loading);
        let pages = self.load_pages(total_pages, schema).await;

        Ok(ExtractionResult::from_pages(
            job_id,
            start_time,
            total_pages,
            &pages,
            self.cancel.is_cancelled(),
        ))
    }

    async fn run_unpaginated(
        &self,
        job_id: Uuid,
        start_time: DateTime<Utc>,
        tracker: &mut PhaseTracker,
    ) -> Result<ExtractionResult> {
        let envelope = self.source.fetch_page(None).await?;
        if envelope.objects().next().is_none() {
            return Ok(ExtractionResult::empty(
                job_id,
                start_time,
                "API returned no records",
            ));
        }

        tracker.enter(JobPhase::Sampling);
        let schema = infer_page_schema(&envelope.rows, &self.config.inference)
            .and_then(|columns| merge_page_schemas([columns]))
            .map(Arc::new)
            .ok_or_else(|| Error::schema("response rows yielded no columns"))?;

        tracker.enter(JobPhase::TableEnsure);
        self.ensure_table(Arc::clone(&schema)).await?;

        tracker.enter(JobPhase::Loading);
        let normalizer = Normalizer::new(Arc::clone(&schema), self.config.field_char_limit);
        let page = Arc::new(normalizer.normalize(None, &envelope.rows));
        drop(envelope);

        let result = match self.page_writer().insert(&schema, page).await {
            Ok(rows) => PageResult::ok(1, rows),
            Err(e) => PageResult::failed(1, e.to_string()),
        };

        Ok(ExtractionResult::from_pages(
            job_id,
            start_time,
            1,
            &[result],
            false,
        ))
    }

    /// Infer the master schema from a spread of pages
    ///
    /// Individual page failures are tolerated; only an empty result is fatal.
    /// Returns `None` when the job is cancelled before sampling finishes.
    async fn sample_schema(
        &self,
        total_pages: u32,
        probe: Envelope,
    ) -> Result<Option<MasterSchema>> {
        let pages = sample_pages(total_pages, self.config.sample_page_cap.max(1));
        debug!("Sampling {} of {} pages", pages.len(), total_pages);

        let options = &self.config.inference;
        let mut probe = Some(probe);

        let fetches = pages.into_iter().map(|page| {
            let cached = if page == 1 { probe.take() } else { None };
            async move {
                let envelope = match cached {
                    Some(envelope) => Ok(envelope),
                    None => self.source.fetch_page(Some(page)).await,
                };
                (page, envelope.map(|e| infer_page_schema(&e.rows, options)))
            }
        });

        let mut sampled: Vec<(u32, Result<Option<Vec<ColumnSchema>>>)> = stream::iter(fetches)
            .buffer_unordered(self.config.sample_concurrency.max(1))
            .take_until(self.cancel.cancelled())
            .collect()
            .await;

        if self.cancel.is_cancelled() {
            info!(
                "Cancellation requested, stopped sampling after {} pages",
                sampled.len()
            );
            return Ok(None);
        }
        sampled.sort_by_key(|(page, _)| *page);

        let mut schemas = Vec::with_capacity(sampled.len());
        for (page, outcome) in sampled {
            match outcome {
                Ok(Some(columns)) => schemas.push(columns),
                Ok(None) => debug!("Sample page {} has no usable rows", page),
                Err(e) => warn!("Sample page {} failed: {}", page, e),
            }
        }

        let schema = merge_page_schemas(schemas)
            .ok_or_else(|| Error::schema("no sampled page yielded a schema"))?;
        info!("Inferred {} columns for {}", schema.len(), self.table);
        Ok(Some(schema))
    }

    async fn ensure_table(&self, schema: Arc<MasterSchema>) -> Result<()> {
        let sink = Arc::clone(&self.sink);
        let table = self.table.clone();

        tokio::task::spawn_blocking(move || sink.ensure_table(&table, &schema))
            .await
            .map_err(|e| Error::ddl(format!("table creation task failed: {e}")))?
    }

    /// Fan out page work under the concurrency bound and drain it through one writer
    async fn load_pages(&self, total_pages: u32, schema: Arc<MasterSchema>) -> Vec<PageResult> {
        let semaphore = Arc::new(Semaphore::new(self.config.effective_concurrency()));
        let (tx, rx) = mpsc::channel(self.config.effective_queue_capacity());
        let progress = Arc::new(Progress::default());
        let normalizer = Arc::new(Normalizer::new(
            Arc::clone(&schema),
            self.config.field_char_limit,
        ));

        let writer = self.spawn_writer(rx, schema, Arc::clone(&progress));

        let reporter_stop = CancellationToken::new();
        let reporter = spawn_progress_reporter(
            Arc::clone(&progress),
            total_pages,
            self.config.progress_interval,
            reporter_stop.clone(),
        );

        let mut fetchers: Vec<(u32, JoinHandle<Option<PageResult>>)> = Vec::new();

        for page in all_pages(total_pages) {
            let permit = tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    info!("Cancellation requested, not starting page {}", page);
                    break;
                }
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let source = Arc::clone(&self.source);
            let normalizer = Arc::clone(&normalizer);
            let progress = Arc::clone(&progress);
            let cancel = self.cancel.clone();
            let tx = tx.clone();
            let delay = self.config.page_delay;

            let handle = tokio::spawn(async move {
                let _permit = permit;

                if cancel.is_cancelled() {
                    return None;
                }

                let envelope = match source.fetch_page(Some(page)).await {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        warn!("Page {} failed: {}", page, e);
                        progress.record_failure();
                        return Some(PageResult::failed(page, e.to_string()));
                    }
                };

                let normalized = normalizer.normalize(Some(page), &envelope.rows);
                drop(envelope);

                tokio::select! {
                    () = cancel.cancelled() => {}
                    () = tokio::time::sleep(delay) => {}
                }

                if tx.send(normalized).await.is_err() {
                    progress.record_failure();
                    return Some(PageResult::failed(page, "writer stopped before page was queued"));
                }
                None
            });
            fetchers.push((page, handle));
        }
        drop(tx);

        let mut results = Vec::with_capacity(total_pages as usize);
        for (page, handle) in fetchers {
            match handle.await {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(e) => {
                    progress.record_failure();
                    results.push(PageResult::failed(page, format!("page task failed: {e}")));
                }
            }
        }

        match writer.await {
            Ok(written) => results.extend(written),
            Err(e) => error!("Writer task failed: {}", e),
        }

        reporter_stop.cancel();
        let _ = reporter.await;

        results.sort_by_key(|result| result.page);
        results
    }

    fn spawn_writer(
        &self,
        mut rx: mpsc::Receiver<NormalizedPage>,
        schema: Arc<MasterSchema>,
        progress: Arc<Progress>,
    ) -> JoinHandle<Vec<PageResult>> {
        let writer = self.page_writer();

        tokio::spawn(async move {
            let mut results = Vec::new();

            while let Some(normalized) = rx.recv().await {
                let page = normalized.page.unwrap_or_default();
                let skipped = normalized.skipped_rows;

                match writer.insert(&schema, Arc::new(normalized)).await {
                    Ok(rows) => {
                        debug!("Page {} loaded: {} rows, {} skipped", page, rows, skipped);
                        progress.record_success(rows);
                        results.push(PageResult::ok(page, rows));
                    }
                    Err(e) => {
                        warn!("Page {} insert failed: {}", page, e);
                        progress.record_failure();
                        results.push(PageResult::failed(page, e.to_string()));
                    }
                }
            }

            results
        })
    }

    fn page_writer(&self) -> PageWriter {
        PageWriter {
            sink: Arc::clone(&self.sink),
            table: self.table.clone(),
            attempts: self.config.insert_attempts,
            delay: self.config.insert_retry_delay,
        }
    }
}

impl std::fmt::Debug for JobController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobController")
            .field("table", &self.table)
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Inserts pages with a bounded number of attempts
struct PageWriter {
    sink: Arc<dyn RelationalSink>,
    table: TableRef,
    attempts: u32,
    delay: Duration,
}

impl PageWriter {
    async fn insert(&self, schema: &Arc<MasterSchema>, page: Arc<NormalizedPage>) -> Result<usize> {
        let attempts = self.attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            let sink = Arc::clone(&self.sink);
            let table = self.table.clone();
            let schema = Arc::clone(schema);
            let page = Arc::clone(&page);

            let outcome = tokio::task::spawn_blocking(move || sink.bulk_insert(&table, &schema, &page))
                .await
                .unwrap_or_else(|e| Err(Error::bulk_load(format!("insert task failed: {e}"))));

            match outcome {
                Ok(rows) => return Ok(rows),
                Err(e) => {
                    if attempt < attempts {
                        let delay = self.delay.saturating_mul(attempt);
                        warn!(
                            "Insert failed: {}, attempt {}/{}, retrying in {:?}",
                            e, attempt, attempts, delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::bulk_load("no insert attempted")))
    }
}

/// Loading counters shared with the progress reporter
#[derive(Debug, Default)]
struct Progress {
    completed: AtomicU32,
    succeeded: AtomicU32,
    records: AtomicU64,
}

impl Progress {
    fn record_success(&self, rows: usize) {
        self.records.fetch_add(rows as u64, Ordering::Relaxed);
        self.succeeded.fetch_add(1, Ordering::Relaxed);
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }
}

fn spawn_progress_reporter(
    progress: Arc<Progress>,
    total_pages: u32,
    interval: Duration,
    stop: CancellationToken,
) -> JoinHandle<()> {
    let period = interval.max(Duration::from_millis(1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            tokio::select! {
                () = stop.cancelled() => break,
                _ = ticker.tick() => {
                    info!(
                        "Progress: {}/{} pages completed, {} succeeded, {} records",
                        progress.completed.load(Ordering::Relaxed),
                        total_pages,
                        progress.succeeded.load(Ordering::Relaxed),
                        progress.records.load(Ordering::Relaxed),
                    );
                }
            }
        }
    })
}

/// Logs phase transitions of one job
struct PhaseTracker {
    job_id: Uuid,
    phase: JobPhase,
    started: Instant,
}

impl PhaseTracker {
    fn new(job_id: Uuid, table: &TableRef) -> Self {
        info!("Job {} started for {} (phase: {})", job_id, table, JobPhase::Probing);
        Self {
            job_id,
            phase: JobPhase::Probing,
            started: Instant::now(),
        }
    }

    fn enter(&mut self, phase: JobPhase) {
        info!("Job {}: {} -> {}", self.job_id, self.phase, phase);
        self.phase = phase;
    }

    fn fail(&mut self, error: &Error) {
        error!("Job {} failed during {}: {}", self.job_id, self.phase, error);
        self.phase = JobPhase::Failed;
    }

    fn finish(&mut self, result: &ExtractionResult) {
        self.enter(JobPhase::Completed);
        info!(
            "Job {} finished in {:?}: {:?}, {} records, {}/{} pages, {} errors",
            self.job_id,
            self.started.elapsed(),
            result.outcome,
            result.records_processed,
            result.pages_processed,
            result.total_pages,
            result.error_count,
        );
    }
}
