//! Media downloads over plain HTTP(S)

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::archiver::config::{calculate_backoff, CONNECT_TIMEOUT, MAX_MEDIA_BYTES};
use crate::config::ArchiveConfig;
use crate::fetcher::{FetcherError, FetcherResult, MediaFetcher};

/// Downloads media files from CDN URLs
pub struct HttpMediaFetcher {
    client: Client,
    max_retries: u32,
    max_bytes: u64,
}

impl HttpMediaFetcher {
    /// Build a fetcher from the run configuration
    pub fn from_config(config: &ArchiveConfig) -> FetcherResult<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| FetcherError::NetworkError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            max_bytes: MAX_MEDIA_BYTES,
        })
    }

    /// Override the per-file size cap
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// One download attempt; the flag on failure says whether a retry may help
    async fn fetch_once(&self, url: &str) -> Result<Bytes, (FetcherError, bool)> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| (FetcherError::NetworkError(e.to_string()), true))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err((FetcherError::RateLimitExceeded, true));
        }
        if !status.is_success() {
            return Err((
                FetcherError::HttpError(format!("HTTP {status} for {url}")),
                status.is_server_error(),
            ));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes {
                return Err((self.oversized(url), false));
            }
        }

        let mut body = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| (FetcherError::NetworkError(e.to_string()), true))?;
            if (body.len() + chunk.len()) as u64 > self.max_bytes {
                return Err((self.oversized(url), false));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body.freeze())
    }

    fn oversized(&self, url: &str) -> FetcherError {
        FetcherError::HttpError(format!("{url} exceeds the {} byte cap", self.max_bytes))
    }
}

#[async_trait]
impl MediaFetcher for HttpMediaFetcher {
    async fn fetch(&self, url: &str) -> FetcherResult<Bytes> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(bytes) => {
                    debug!(url, bytes = bytes.len(), "Media downloaded");
                    crate::metrics::record_media_bytes(bytes.len() as u64);
                    return Ok(bytes);
                }
                Err((e, true)) if attempt < self.max_retries => {
                    let backoff = calculate_backoff(attempt);
                    warn!(url, attempt = attempt + 1, error = %e, ?backoff, "Media download failed, retrying");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err((e, _)) => return Err(e),
            }
        }
    }
}
