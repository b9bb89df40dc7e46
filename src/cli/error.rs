//! CLI error types and conversions

use crate::archiver::{ArchiveError, RateLimitError};
use crate::config::ConfigError;
use crate::fetcher::FetcherError;
use crate::metrics::MetricsError;
use crate::output::OutputError;
use crate::shortcode::ShortcodeError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// Identifier error
    #[error("identifier error: {0}")]
    ShortcodeError(#[from] ShortcodeError),

    /// Fetcher error
    #[error("fetcher error: {0}")]
    FetcherError(#[from] FetcherError),

    /// Archive run error
    #[error("archive error: {0}")]
    ArchiveError(#[from] ArchiveError),

    /// Output error
    #[error("output error: {0}")]
    OutputError(#[from] OutputError),

    /// Rate limiter error
    #[error("rate limiter error: {0}")]
    RateLimitError(#[from] RateLimitError),

    /// Metrics exporter error
    #[error("metrics error: {0}")]
    MetricsError(#[from] MetricsError),

    /// Result could not be rendered
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
