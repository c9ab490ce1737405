//! CLI commands and argument parsing

use crate::types::ExtractionFlow;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Paginated REST API loader
#[derive(Parser, Debug)]
#[command(name = "restload")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Loader configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one extraction job
    Extract {
        /// Extraction request file (JSON)
        #[arg(short, long)]
        request: PathBuf,

        /// Extraction flow
        #[arg(long, value_enum, default_value = "paginated")]
        flow: FlowArg,
    },

    /// Print today's rolling token for a secret
    Token {
        /// Shared secret
        #[arg(long)]
        secret: String,
    },
}

/// Extraction flow argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FlowArg {
    /// Page-by-page extraction
    Paginated,
    /// Single date-filtered request
    Simple,
    /// Single full-history request
    Basic,
}

impl From<FlowArg> for ExtractionFlow {
    fn from(flow: FlowArg) -> Self {
        match flow {
            FlowArg::Paginated => ExtractionFlow::Paginated,
            FlowArg::Simple => ExtractionFlow::Simple,
            FlowArg::Basic => ExtractionFlow::Basic,
        }
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON
    Json,
    /// Indented JSON
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extract() {
        let cli = Cli::try_parse_from([
            "restload",
            "extract",
            "--request",
            "job.json",
            "--flow",
            "simple",
            "-C",
            "restload.yaml",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("restload.yaml")));
        match cli.command {
            Commands::Extract { request, flow } => {
                assert_eq!(request, PathBuf::from("job.json"));
                assert_eq!(ExtractionFlow::from(flow), ExtractionFlow::Simple);
            }
            Commands::Token { .. } => panic!("expected extract"),
        }
    }

    #[test]
    fn test_parse_token_verbose() {
        let cli = Cli::try_parse_from(["restload", "-v", "token", "--secret", "s"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Token { secret } if secret == "s"));
    }

    #[test]
    fn test_flow_defaults_to_paginated() {
        let cli = Cli::try_parse_from(["restload", "extract", "-r", "job.json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Extract {
                flow: FlowArg::Paginated,
                ..
            }
        ));
    }
}
