//! CLI module
//!
//! Command-line interface for running extraction jobs.
//!
//! # Commands
//!
//! - `extract` - Load one extraction request into the configured database
//! - `token` - Print today's rolling token for a secret

mod commands;
mod runner;

pub use commands::{Cli, Commands, FlowArg, OutputFormat};
pub use runner::Runner;
