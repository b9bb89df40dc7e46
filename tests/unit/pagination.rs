//! Unit tests for feed pagination and single-post lookup

use crate::support::{feed_page, image_item, video_item, FakeApi};
use post_archiver::archiver::RateLimiter;
use post_archiver::fetcher::pagination::MAX_PAGES;
use post_archiver::fetcher::{FeedPaginator, FetcherError, PostLookup, Session};
use std::sync::Arc;
use std::time::Duration;

fn session() -> Session {
    Session {
        user_id: "42".to_string(),
        username: "someone".to_string(),
    }
}

fn paginator(api: Arc<FakeApi>, budget: usize) -> (FeedPaginator, Arc<RateLimiter>) {
    let limiter = Arc::new(RateLimiter::new(budget, Duration::from_secs(3600)).unwrap());
    (FeedPaginator::new(api, limiter.clone(), session()), limiter)
}

#[tokio::test]
async fn test_cursor_threading_across_pages() {
    let api = Arc::new(FakeApi::with_pages(vec![
        Ok(feed_page(vec![image_item("1", 300), image_item("2", 200)], Some("c1"))),
        Ok(feed_page(vec![video_item("3", 100)], Some("c2"))),
        Ok(feed_page(vec![], None)),
    ]));
    let (paginator, limiter) = paginator(api.clone(), 100);

    let posts = paginator.fetch_all().await.unwrap();

    let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(
        *api.cursors.lock().unwrap(),
        vec![None, Some("c1".to_string()), Some("c2".to_string())]
    );
    // One acquisition per page
    assert_eq!(limiter.in_window().await, 3);
}

#[tokio::test]
async fn test_mid_feed_failure_discards_collected_posts() {
    let api = Arc::new(FakeApi::with_pages(vec![
        Ok(feed_page(vec![image_item("1", 100)], Some("c1"))),
        Err(FetcherError::HttpError("client error 400".to_string())),
    ]));
    let (paginator, _) = paginator(api, 10);

    let err = paginator.fetch_all().await.unwrap_err();
    assert!(matches!(err, FetcherError::FeedFetchError(ref m) if m.contains("page 2")));
}

#[tokio::test]
async fn test_more_available_without_cursor_is_an_error() {
    let mut page = feed_page(vec![image_item("1", 100)], None);
    page.more_available = true;
    let api = Arc::new(FakeApi::with_pages(vec![Ok(page)]));
    let (paginator, _) = paginator(api, 10);

    assert!(matches!(
        paginator.fetch_all().await,
        Err(FetcherError::FeedFetchError(_))
    ));
}

#[tokio::test]
async fn test_malformed_item_aborts_pagination() {
    let mut broken = image_item("2", 100);
    broken["image_versions2"]["candidates"] = serde_json::json!([]);
    let api = Arc::new(FakeApi::with_pages(vec![Ok(feed_page(
        vec![image_item("1", 200), broken],
        None,
    ))]));
    let (paginator, _) = paginator(api, 10);

    assert!(matches!(
        paginator.fetch_all().await,
        Err(FetcherError::MalformedItem(_))
    ));
}

#[tokio::test]
async fn test_endless_feed_hits_page_cap() {
    let api = Arc::new(FakeApi {
        endless_feed: true,
        ..FakeApi::default()
    });
    let (paginator, _) = paginator(api.clone(), MAX_PAGES + 10);

    let err = paginator.fetch_all().await.unwrap_err();

    assert!(matches!(err, FetcherError::FeedFetchError(ref m) if m.contains("Max pages")));
    assert_eq!(api.cursors.lock().unwrap().len(), MAX_PAGES);
}

#[tokio::test]
async fn test_fetch_one_by_shortcode() {
    let api = Arc::new(FakeApi::default());
    *api.detail.lock().unwrap() = Some(image_item("64", 100));
    let (paginator, limiter) = paginator(api.clone(), 10);

    let lookup = paginator.fetch_one("BA").await.unwrap();

    assert!(matches!(lookup, PostLookup::Found(ref post) if post.id == "64"));
    assert_eq!(*api.detail_requests.lock().unwrap(), vec!["64".to_string()]);
    assert_eq!(limiter.in_window().await, 1);
}

#[tokio::test]
async fn test_fetch_one_not_found() {
    let api = Arc::new(FakeApi::default());
    let (paginator, _) = paginator(api, 10);

    let lookup = paginator.fetch_one("12345").await.unwrap();
    assert_eq!(
        lookup,
        PostLookup::NotFound {
            identifier: "12345".to_string()
        }
    );
}

#[tokio::test]
async fn test_fetch_one_invalid_identifier_makes_no_request() {
    let api = Arc::new(FakeApi::default());
    let (paginator, limiter) = paginator(api.clone(), 10);

    assert!(matches!(
        paginator.fetch_one("no spaces!").await,
        Err(FetcherError::InvalidIdentifier(_))
    ));
    assert!(api.detail_requests.lock().unwrap().is_empty());
    assert_eq!(limiter.in_window().await, 0);
}
