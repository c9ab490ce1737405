//! Execution engine module
//!
//! Drives one extraction job through its phases.
//!
//! # Overview
//!
//! The engine module provides:
//! - `JobController` - probe, sample, ensure table and load under a concurrency bound
//! - `Extractor` - validates an `ExtractionRequest` and wires the HTTP source to a sink
//! - `JobConfig` - tuning for a job
//! - `ExtractionResult` - the structured result every job returns
//!
//! # Loading pipeline
//!
//! ```text
//!  pages 1..N ──► [semaphore] ──► fetch ─► normalize ─► delay ─┐
//!                  (N workers)                                 │ bounded mpsc
//!                                                              ▼
//!                                              single writer ─► bulk_insert
//! ```

mod controller;
mod extract;
mod types;

pub use controller::JobController;
pub use extract::Extractor;
pub use types::{
    ConnectionInfo, ExtractionRequest, ExtractionResult, JobConfig, JobOutcome, JobPhase,
    PageResult, MIN_OPTIONS,
};
