//! Archive pipeline and request pacing
//!
//! # Overview
//!
//! One run moves through:
//!
//! 1. **Login**: obtain a session through [`crate::fetcher::PlatformApi`]
//! 2. **Fetch**: page through the feed with [`crate::fetcher::FeedPaginator`]
//! 3. **Archive**: per post, mark it archived remotely and download its media
//! 4. **Persist**: hand every fetched post to the [`crate::output::ArchiveSink`]
//!
//! Every remote call acquires from the shared [`RateLimiter`] first. Step 3
//! is isolated per post: a failure is logged and recorded in the
//! [`ArchiveReport`], then the batch carries on. Failures in steps 1 and 2
//! abort the run before anything is written.
//!
//! # Components
//!
//! - [`orchestrator`] - Drives the run
//! - [`rate_limit`] - Sliding-window limiter
//! - [`report`] - Per-post outcomes
//! - [`config`] - Transport constants and backoff calculation

pub mod config;
pub mod orchestrator;
pub mod rate_limit;
pub mod report;

pub use orchestrator::ArchiveOrchestrator;
pub use rate_limit::{RateLimitError, RateLimiter};
pub use report::{ArchiveReport, MediaOutcome, PostOutcome, StepOutcome};

use crate::fetcher::FetcherError;
use crate::output::OutputError;

/// Archive pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// Remote archive call failed for one post
    #[error("archive step failed: {0}")]
    ArchiveStepError(String),

    /// Media download or write failed for one file
    #[error("download step failed: {0}")]
    DownloadStepError(String),

    /// Login or feed fetch failed
    #[error(transparent)]
    Fetch(#[from] FetcherError),

    /// Metadata could not be persisted
    #[error(transparent)]
    Output(#[from] OutputError),

    /// Limiter could not be built
    #[error(transparent)]
    RateLimit(#[from] RateLimitError),
}

/// Result type for archive operations
pub type ArchiveResult<T> = Result<T, ArchiveError>;
