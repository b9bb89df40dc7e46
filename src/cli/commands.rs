//! Command line surface

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

use super::CliError;
use crate::archiver::{ArchiveOrchestrator, ArchiveReport, RateLimiter};
use crate::config::{ArchiveConfig, ConfigArgs};
use crate::fetcher::http::HttpPlatformClient;
use crate::fetcher::media::HttpMediaFetcher;
use crate::fetcher::PostLookup;
use crate::output::LocalArchiveSink;
use crate::shortcode;
use crate::shutdown::SharedShutdown;

/// Post archiver CLI
#[derive(Parser, Debug)]
#[command(name = "post-archiver")]
#[command(about = "Archive your posts: mark them archived, download their media and export metadata", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Run configuration
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9090)
    #[arg(long, global = true, env = "METRICS_ADDR")]
    pub metrics_addr: Option<SocketAddr>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "human")]
    pub output_format: OutputFormat,

    /// Show a progress bar while archiving
    #[arg(long, global = true, default_value_t = false)]
    pub progress: bool,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one full archive pass
    Archive,

    /// Re-run the archive pass every AUTOMATION_INTERVAL_HOURS until Ctrl+C
    Watch,

    /// Fetch a single post by shortcode, permalink or numeric media id
    Fetch {
        /// Shortcode, permalink or numeric media id
        #[arg(long)]
        id: String,
    },

    /// Decode a shortcode into its numeric media id
    Decode {
        /// Shortcode
        shortcode: String,
    },

    /// Encode a numeric media id as a shortcode
    Encode {
        /// Numeric media id
        id: u64,
    },
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

impl Cli {
    /// Execute the selected command
    pub async fn execute(self, shutdown: SharedShutdown) -> Result<(), CliError> {
        match self.command {
            Commands::Decode { ref shortcode } => {
                let id = shortcode::decode(shortcode)?;
                self.print(&json!({ "shortcode": shortcode, "id": id }), &id.to_string())
            }
            Commands::Encode { id } => {
                let code = shortcode::encode(id);
                self.print(&json!({ "id": id, "shortcode": code }), &code)
            }
            _ => {
                if let Some(addr) = self.metrics_addr {
                    crate::metrics::init_metrics(addr).await?;
                }

                let config = self.config.clone().into_config()?;
                config.validate_credentials()?;

                match self.command {
                    Commands::Archive => self.archive(&config, shutdown).await,
                    Commands::Watch => self.watch(&config, shutdown).await,
                    Commands::Fetch { ref id } => self.fetch(&config, shutdown, id).await,
                    Commands::Decode { .. } | Commands::Encode { .. } => Ok(()),
                }
            }
        }
    }

    async fn archive(&self, config: &ArchiveConfig, shutdown: SharedShutdown) -> Result<(), CliError> {
        let orchestrator = self.build_orchestrator(config, shutdown)?;
        let report = orchestrator.run(&config.credentials()).await?;
        self.print_report(&report, config)
    }

    async fn watch(&self, config: &ArchiveConfig, shutdown: SharedShutdown) -> Result<(), CliError> {
        let orchestrator = self.build_orchestrator(config, shutdown.clone())?;
        let credentials = config.credentials();
        let interval = config.automation_interval();
        let mut cycle: u64 = 0;

        info!(
            interval_hours = config.automation_interval_hours,
            "Watch mode started"
        );

        while !shutdown.is_shutdown_requested() {
            cycle += 1;
            match orchestrator.run(&credentials).await {
                Ok(report) => info!(cycle, %report, "Archive cycle finished"),
                Err(e) => error!(cycle, error = %e, "Archive cycle failed"),
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.wait_for_shutdown() => {}
            }
        }

        info!(cycles = cycle, "Watch mode stopped");
        Ok(())
    }

    async fn fetch(
        &self,
        config: &ArchiveConfig,
        shutdown: SharedShutdown,
        identifier: &str,
    ) -> Result<(), CliError> {
        // Fail on a malformed identifier before logging in
        shortcode::resolve_media_id(identifier)?;

        let orchestrator = self.build_orchestrator(config, shutdown)?;
        let session = orchestrator.login(&config.credentials()).await?;

        match orchestrator.fetch_one(&session, identifier).await? {
            PostLookup::Found(post) => {
                let human = serde_json::to_string_pretty(&post)?;
                self.print(&serde_json::to_value(&post)?, &human)
            }
            PostLookup::NotFound { identifier } => self.print(
                &json!({ "identifier": identifier, "found": false }),
                &format!("not found: {identifier}"),
            ),
        }
    }

    fn build_orchestrator(
        &self,
        config: &ArchiveConfig,
        shutdown: SharedShutdown,
    ) -> Result<ArchiveOrchestrator, CliError> {
        let limiter = Arc::new(RateLimiter::from_config(config)?);
        let api = Arc::new(HttpPlatformClient::from_config(config)?);
        let media = Arc::new(HttpMediaFetcher::from_config(config)?);
        let sink = Arc::new(LocalArchiveSink::new(&config.archive_base_path)?);

        Ok(ArchiveOrchestrator::new(api, media, sink, limiter, config)
            .with_progress(self.progress)
            .with_shutdown(shutdown))
    }

    fn print_report(&self, report: &ArchiveReport, config: &ArchiveConfig) -> Result<(), CliError> {
        let value = json!({
            "total": report.total(),
            "archived": report.archived(),
            "archive_failures": report.archive_failures(),
            "media_stored": report.media_stored(),
            "media_failures": report.media_failures(),
            "interrupted": report.is_interrupted(),
            "archive_base_path": config.archive_base_path,
            "outcomes": report.outcomes(),
        });
        let human = format!(
            "Archive complete: {report}\nMetadata written under {}",
            config.archive_base_path.display()
        );
        self.print(&value, &human)
    }

    fn print(&self, value: &serde_json::Value, human: &str) -> Result<(), CliError> {
        match self.output_format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Human => println!("{human}"),
        }
        Ok(())
    }
}
