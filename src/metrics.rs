//! Archive run metrics
//!
//! Recording goes through the `metrics` facade, so every helper here is a
//! no-op until [`init_metrics`] installs the Prometheus exporter.
//!
//! ## Exported series
//!
//! - `remote_requests_total{endpoint}` - private API requests, retries included
//! - `rate_limit_wait_seconds` - time spent suspended in the rate limiter
//! - `posts_fetched_total` - posts converted from the feed
//! - `archive_step_failures_total` - failed remote archive calls
//! - `download_step_failures_total` - failed media downloads or writes
//! - `media_bytes_downloaded_total` - media bytes received
//! - `archive_runs_total{outcome}` - completed and failed runs

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// Global metrics registry initialization flag
static METRICS_INITIALIZED: Lazy<Arc<RwLock<bool>>> = Lazy::new(|| Arc::new(RwLock::new(false)));

/// Metrics setup errors
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// The exporter could not be installed or bound
    #[error("failed to install Prometheus exporter: {0}")]
    Install(String),
}

/// Initialize metrics with a Prometheus scrape endpoint on `addr`
///
/// Idempotent: later calls are ignored.
pub async fn init_metrics(addr: SocketAddr) -> Result<(), MetricsError> {
    let mut initialized = METRICS_INITIALIZED.write().await;
    if *initialized {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    describe_counter!(
        "remote_requests_total",
        Unit::Count,
        "Requests sent to the private platform API, retries included"
    );
    describe_histogram!(
        "rate_limit_wait_seconds",
        Unit::Seconds,
        "Time spent waiting for the request budget"
    );
    describe_counter!(
        "posts_fetched_total",
        Unit::Count,
        "Posts converted from the feed"
    );
    describe_counter!(
        "archive_step_failures_total",
        Unit::Count,
        "Remote archive calls that failed"
    );
    describe_counter!(
        "download_step_failures_total",
        Unit::Count,
        "Media files that could not be downloaded or written"
    );
    describe_counter!(
        "media_bytes_downloaded_total",
        Unit::Bytes,
        "Media bytes received"
    );
    describe_counter!(
        "archive_runs_total",
        Unit::Count,
        "Archive runs by outcome"
    );

    *initialized = true;
    info!(%addr, "Metrics exporter listening");
    Ok(())
}

/// Check if metrics system is initialized
pub async fn is_initialized() -> bool {
    *METRICS_INITIALIZED.read().await
}

/// Count one request to `endpoint`
pub fn record_remote_request(endpoint: &'static str) {
    counter!("remote_requests_total", "endpoint" => endpoint).increment(1);
}

/// Record time spent waiting in the rate limiter
pub fn record_rate_limit_wait(waited: Duration) {
    histogram!("rate_limit_wait_seconds").record(waited.as_secs_f64());

    if waited > Duration::ZERO {
        debug!(wait_ms = waited.as_millis() as u64, "Rate limiter wait recorded");
    }
}

/// Count posts produced by pagination
pub fn record_posts_fetched(count: usize) {
    counter!("posts_fetched_total").increment(count as u64);
}

/// Count a failed archive step
pub fn record_archive_failure() {
    counter!("archive_step_failures_total").increment(1);
}

/// Count a failed media download or write
pub fn record_download_failure() {
    counter!("download_step_failures_total").increment(1);
}

/// Count downloaded media bytes
pub fn record_media_bytes(bytes: u64) {
    counter!("media_bytes_downloaded_total").increment(bytes);
}

/// Tracks one archive run from start to outcome
pub struct RunMetrics {
    username: String,
    start_time: Instant,
}

impl RunMetrics {
    /// Start tracking a run for `username`
    pub fn start(username: impl Into<String>) -> Self {
        let username = username.into();
        info!(username = %username, "Archive run started");
        Self {
            username,
            start_time: Instant::now(),
        }
    }

    /// Record a completed run
    pub fn record_success(&self, posts: usize) {
        counter!("archive_runs_total", "outcome" => "completed").increment(1);
        info!(
            username = %self.username,
            posts,
            duration_secs = self.start_time.elapsed().as_secs(),
            "Archive run completed"
        );
    }

    /// Record a run that aborted before writing metadata
    pub fn record_failure(&self, error: &str) {
        counter!("archive_runs_total", "outcome" => "failed").increment(1);
        error!(
            username = %self.username,
            error = %error,
            duration_secs = self.start_time.elapsed().as_secs(),
            "Archive run failed"
        );
    }
}
