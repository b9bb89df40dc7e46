//! Transport tuning constants

use std::time::Duration;

/// Initial backoff delay in milliseconds.
pub const INITIAL_BACKOFF_MS: u64 = 1000;

/// Maximum backoff delay in milliseconds.
/// Caps the exponential growth so a run with a generous retry budget still
/// makes progress within a minute per failed call.
pub const MAX_BACKOFF_MS: u64 = 30_000;

/// Connect timeout for the shared HTTP clients.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on a single media download (256 MiB).
pub const MAX_MEDIA_BYTES: u64 = 256 * 1024 * 1024;

/// Calculate exponential backoff delay
pub fn calculate_backoff(retry_count: u32) -> Duration {
    let factor = 2u64.saturating_pow(retry_count);
    let delay_ms = INITIAL_BACKOFF_MS.saturating_mul(factor).min(MAX_BACKOFF_MS);
    Duration::from_millis(delay_ms)
}
