//! Integration tests for logging and tracing

use crate::support::{feed_page, image_item, FakeApi, FakeMedia, MemorySink};
use post_archiver::archiver::{ArchiveOrchestrator, RateLimiter};
use post_archiver::config::ArchiveConfig;
use post_archiver::fetcher::Credentials;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("post_archiver=trace"))
        .with_test_writer()
        .try_init();
}

#[test]
fn test_json_subscriber_builds() {
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new("post_archiver=info"))
        .with_test_writer()
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(posts = 3, "Metadata exported");
    });
}

#[test]
fn test_env_filter_directives_parse() {
    for directive in ["post_archiver=debug", "post_archiver::fetcher=trace,warn", "info"] {
        assert!(EnvFilter::try_new(directive).is_ok(), "{directive} rejected");
    }
}

#[tokio::test]
async fn test_archive_run_logs_under_trace_level() {
    init_test_tracing();

    let api = Arc::new(FakeApi::with_pages(vec![Ok(feed_page(
        vec![image_item("1", 1_700_000_000)],
        None,
    ))]));
    let orchestrator = ArchiveOrchestrator::new(
        api,
        Arc::new(FakeMedia::default()),
        Arc::new(MemorySink::default()),
        Arc::new(RateLimiter::new(100, Duration::from_secs(60)).unwrap()),
        &ArchiveConfig::default(),
    );

    let credentials = Credentials {
        username: "someone".to_string(),
        password: "secret".to_string(),
    };
    let report = orchestrator.run(&credentials).await.unwrap();

    assert_eq!(report.total(), 1);
}
