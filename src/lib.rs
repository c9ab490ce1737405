// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # restload
//!
//! Loads paginated JSON from an authenticated REST API into a relational
//! table, inferring the destination schema from sampled pages instead of
//! requiring one up front.
//!
//! ## Features
//!
//! - **Retried fetches**: form POST with a rolling daily token, exponential backoff
//! - **Schema inference**: per-column confidence thresholds over a bounded page sample
//! - **Normalization**: every page reshaped to the agreed column set and order
//! - **DuckDB sink**: idempotent table creation and Appender-based bulk load
//! - **Bounded loading**: fixed fetch concurrency, one writer, partial success reporting
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use restload::database::{DuckDbSink, SinkOptions};
//! use restload::engine::{ExtractionRequest, Extractor};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> restload::Result<()> {
//!     let request: ExtractionRequest = serde_json::from_str(&std::fs::read_to_string("job.json")?)?;
//!     let sink = DuckDbSink::open("warehouse.duckdb", SinkOptions::default())?;
//!
//!     let result = Extractor::new(Arc::new(sink))
//!         .run_paginated(&request, CancellationToken::new())
//!         .await;
//!     println!("{}", result.message);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Job Controller                          │
//! │  Probing → Sampling → TableEnsure → Loading → Completed/Failed  │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │   Auth   │   HTTP    │    Schema     │ Normalize │  Database   │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Rolling  │ Form POST │ Page sampling │ Column    │ Namespace   │
//! │  token   │ Retry     │ Type voting   │  order    │ Sequence    │
//! │ Static   │ Backoff   │ Merge         │ Truncate  │ Staging     │
//! │ Basic    │ Rate Limit│               │ Coerce    │ Appender    │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Rolling token and request authentication
pub mod auth;

/// HTTP client with retry and rate limiting, and the page source
pub mod http;

/// Page plans for sampling and loading
pub mod pagination;

/// Response envelope decoding
pub mod decode;

/// Schema inference from JSON rows
pub mod schema;

/// Page normalization against a master schema
pub mod normalize;

/// Relational sink backed by DuckDB
pub mod database;

/// Job controller and extraction entry point
pub mod engine;

/// Loader configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::LoaderConfig;
pub use engine::{ExtractionRequest, ExtractionResult, Extractor, JobController};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
