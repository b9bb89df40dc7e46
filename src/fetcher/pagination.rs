//! Cursor-based feed pagination
//!
//! [`FeedPaginator`] walks the session owner's feed page by page, acquiring
//! one unit from the shared [`RateLimiter`] before every request, and
//! converts items as they arrive. The walk is a loop bounded by
//! [`MAX_PAGES`]; any remote failure aborts it and discards what was
//! collected so far.

use crate::archiver::RateLimiter;
use crate::fetcher::converter::PostConverter;
use crate::fetcher::{FetcherError, FetcherResult, PlatformApi, Session};
use crate::shortcode;
use crate::Post;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Maximum number of pages walked in one fetch
pub const MAX_PAGES: usize = 10_000;

/// Continuation token handed back by the feed endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor(String);

impl PageCursor {
    /// Wrap a raw continuation token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a single-post lookup
#[derive(Debug, Clone, PartialEq)]
pub enum PostLookup {
    /// The platform returned the post
    Found(Post),
    /// The platform returned no item for the identifier
    NotFound {
        /// Identifier as supplied by the caller
        identifier: String,
    },
}

/// Paginates the feed of one session
pub struct FeedPaginator {
    api: Arc<dyn PlatformApi>,
    limiter: Arc<RateLimiter>,
    session: Session,
}

impl FeedPaginator {
    /// Create a paginator for `session`, pacing requests through `limiter`
    pub fn new(api: Arc<dyn PlatformApi>, limiter: Arc<RateLimiter>, session: Session) -> Self {
        Self {
            api,
            limiter,
            session,
        }
    }

    /// Session the paginator fetches for
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Fetch and convert every post in the feed, newest first
    ///
    /// # Errors
    /// - [`FetcherError::FeedFetchError`] if a page request fails, a page
    ///   claims more items without a cursor, or [`MAX_PAGES`] is exceeded
    /// - [`FetcherError::MalformedItem`] if an item cannot be converted
    pub async fn fetch_all(&self) -> FetcherResult<Vec<Post>> {
        self.fetch_from(None).await
    }

    /// Fetch and convert every post starting at `cursor` (`None` for the top
    /// of the feed)
    pub async fn fetch_from(&self, cursor: Option<PageCursor>) -> FetcherResult<Vec<Post>> {
        let mut posts = Vec::new();
        let mut cursor = cursor;
        let mut page_number = 0;

        loop {
            if page_number >= MAX_PAGES {
                return Err(FetcherError::FeedFetchError(format!(
                    "Max pages ({MAX_PAGES}) exceeded for user {}, last cursor: {:?}",
                    self.session.user_id, cursor
                )));
            }
            page_number += 1;

            self.limiter.acquire().await;

            debug!(
                page = page_number,
                cursor = ?cursor.as_ref().map(PageCursor::as_str),
                "Fetching feed page"
            );

            let page = self
                .api
                .get_feed_page(&self.session, cursor.as_ref())
                .await
                .map_err(|e| match e {
                    FetcherError::FeedFetchError(_) => e,
                    other => FetcherError::FeedFetchError(format!("page {page_number}: {other}")),
                })?;

            debug!(
                page = page_number,
                items = page.items.len(),
                more_available = page.more_available,
                "Received feed page"
            );

            for item in &page.items {
                posts.push(PostConverter::convert(item)?);
            }

            if !page.more_available {
                break;
            }

            match page.next_max_id.filter(|token| !token.is_empty()) {
                Some(token) => cursor = Some(PageCursor::new(token)),
                None => {
                    return Err(FetcherError::FeedFetchError(format!(
                        "page {page_number} reports more items but carries no cursor"
                    )))
                }
            }
        }

        info!(
            pages = page_number,
            posts = posts.len(),
            "Feed pagination complete"
        );
        crate::metrics::record_posts_fetched(posts.len());

        Ok(posts)
    }

    /// Look up a single post by shortcode, permalink or numeric media id
    ///
    /// # Errors
    /// [`FetcherError::InvalidIdentifier`] for an identifier that is not
    /// decodable; remote and conversion errors are passed through.
    pub async fn fetch_one(&self, identifier: &str) -> FetcherResult<PostLookup> {
        let media_id = shortcode::resolve_media_id(identifier)?;

        self.limiter.acquire().await;
        debug!(identifier, media_id = %media_id, "Fetching item detail");

        let detail = self.api.get_item_detail(&self.session, &media_id).await?;

        match detail.items.first() {
            Some(item) => Ok(PostLookup::Found(PostConverter::convert(item)?)),
            None => {
                debug!(identifier, "No item returned");
                Ok(PostLookup::NotFound {
                    identifier: identifier.to_string(),
                })
            }
        }
    }
}
