//! Remote platform access
//!
//! The pipeline talks to the platform through two seams:
//!
//! - [`PlatformApi`] - login, feed pages, single-item detail and the archive call
//! - [`MediaFetcher`] - plain URL to bytes for media downloads
//!
//! Raw payloads are deserialized into the schema in [`raw`] and turned into
//! typed posts by [`converter::PostConverter`]. [`pagination::FeedPaginator`]
//! drives the feed, pacing each request through the shared rate limiter.

use crate::shortcode::ShortcodeError;
use async_trait::async_trait;
use bytes::Bytes;

pub mod converter;
pub mod http;
pub mod media;
pub mod pagination;
pub mod raw;

pub use converter::PostConverter;
pub use pagination::{FeedPaginator, PageCursor, PostLookup};
pub use raw::{RawFeedPage, RawItem, RawItemDetail, RawLoginResponse, RawStatus};

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Login rejected or session unusable
    #[error("authentication failed: {0}")]
    AuthError(String),

    /// Feed page request failed
    #[error("feed fetch failed: {0}")]
    FeedFetchError(String),

    /// Raw item lacks structure its media type requires
    #[error("malformed item: {0}")]
    MalformedItem(String),

    /// Caller supplied an identifier that is neither numeric nor a shortcode
    #[error(transparent)]
    InvalidIdentifier(#[from] ShortcodeError),

    /// HTTP status error
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Transport failure (connect, timeout, body read)
    #[error("network error: {0}")]
    NetworkError(String),

    /// Response body could not be decoded
    #[error("parse error: {0}")]
    ParseError(String),

    /// Platform kept answering 429
    #[error("rate limit exceeded")]
    RateLimitExceeded,
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Login credentials
#[derive(Clone)]
pub struct Credentials {
    /// Account username
    pub username: String,
    /// Account password
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Authenticated session handle returned by [`PlatformApi::login`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Numeric id of the logged-in account
    pub user_id: String,
    /// Username of the logged-in account
    pub username: String,
}

/// Private platform API
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Authenticate and obtain a session
    ///
    /// # Errors
    /// [`FetcherError::AuthError`] when the platform rejects the credentials
    async fn login(&self, credentials: &Credentials) -> FetcherResult<Session>;

    /// Fetch one page of the session owner's feed
    ///
    /// # Arguments
    /// * `cursor` - `None` for the first page, then the previous page's cursor
    async fn get_feed_page(
        &self,
        session: &Session,
        cursor: Option<&PageCursor>,
    ) -> FetcherResult<RawFeedPage>;

    /// Fetch the detail of a single media item (zero or one item)
    async fn get_item_detail(&self, session: &Session, media_id: &str)
        -> FetcherResult<RawItemDetail>;

    /// Ask the platform to archive (hide) a media item
    async fn set_archived(&self, session: &Session, media_id: &str) -> FetcherResult<RawStatus>;
}

/// Downloads media bytes
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Fetch the body at `url`
    async fn fetch(&self, url: &str) -> FetcherResult<Bytes>;
}
