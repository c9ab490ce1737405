//! CLI runner - executes commands

use crate::auth::current_token;
use crate::cli::commands::{Cli, Commands, FlowArg, OutputFormat};
use crate::config::LoaderConfig;
use crate::database::DuckDbSink;
use crate::engine::{ExtractionRequest, Extractor};
use crate::error::{Error, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    ///
    /// Returns whether the command succeeded; a finished job that failed is
    /// `Ok(false)`, not an error.
    pub async fn run(&self) -> Result<bool> {
        match &self.cli.command {
            Commands::Extract { request, flow } => self.extract(request, *flow).await,
            Commands::Token { secret } => {
                println!("{}", current_token(secret));
                Ok(true)
            }
        }
    }

    /// Load the config file, or defaults plus environment when none was given
    fn load_config(&self) -> Result<LoaderConfig> {
        match self.cli.config {
            Some(ref path) => LoaderConfig::load(path),
            None => Ok(LoaderConfig::from_env()),
        }
    }

    async fn extract(&self, request_path: &Path, flow: FlowArg) -> Result<bool> {
        let config = self.load_config()?;
        let location = config.database_location()?;
        let request = load_request(request_path)?;

        let sink = DuckDbSink::open(location, config.sink_options())?;
        let extractor = Extractor::new(Arc::new(sink))
            .with_http_config(config.http_client_config())
            .with_decoder(config.decoder())
            .with_job_config(config.job_config());

        let cancel = CancellationToken::new();
        let signal_cancel = cancel.clone();
        let signal = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, finishing in-flight pages");
                signal_cancel.cancel();
            }
        });

        let result = extractor.extract(&request, flow.into(), cancel).await;
        signal.abort();

        info!("{}", result.message);
        self.output(&result);
        Ok(result.success)
    }

    fn output<T: Serialize>(&self, value: &T) {
        let rendered = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(value),
            OutputFormat::Pretty => serde_json::to_string_pretty(value),
        };
        println!("{}", rendered.unwrap_or_default());
    }
}

fn load_request(path: &Path) -> Result<ExtractionRequest> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "Failed to read request file '{}': {}",
            path.display(),
            e
        ))
    })?;
    serde_json::from_str(&content)
        .map_err(|e| Error::validation(format!("malformed request '{}': {e}", path.display())))
}
