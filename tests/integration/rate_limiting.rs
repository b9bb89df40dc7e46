//! Integration tests for request pacing

use post_archiver::archiver::RateLimiter;
use post_archiver::config::ArchiveConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_budget_within_window_is_immediate() {
    let limiter = RateLimiter::new(5, Duration::from_secs(60)).unwrap();
    let start = Instant::now();

    for _ in 0..5 {
        assert_eq!(limiter.acquire().await, Duration::ZERO);
    }

    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(limiter.in_window().await, 5);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_budget_waits_for_oldest_to_expire() {
    let limiter = RateLimiter::new(2, Duration::from_secs(60)).unwrap();
    let start = Instant::now();

    limiter.acquire().await;
    tokio::time::advance(Duration::from_secs(10)).await;
    limiter.acquire().await;

    let waited = limiter.acquire().await;

    // Third slot opens when the first acquisition leaves the window
    assert_eq!(start.elapsed(), Duration::from_secs(60));
    assert_eq!(waited, Duration::from_secs(50));
}

#[tokio::test(start_paused = true)]
async fn test_window_never_exceeds_budget_under_load() {
    let limiter = Arc::new(RateLimiter::new(3, Duration::from_secs(30)).unwrap());
    let start = Instant::now();

    let mut handles = Vec::new();
    for _ in 0..9 {
        let limiter = limiter.clone();
        handles.push(tokio::spawn(async move {
            limiter.acquire().await;
            Instant::now()
        }));
    }

    let mut issued = Vec::new();
    for handle in handles {
        issued.push(handle.await.unwrap());
    }
    issued.sort();

    for (i, at) in issued.iter().enumerate() {
        let in_window = issued[..=i]
            .iter()
            .filter(|earlier| at.duration_since(**earlier) < Duration::from_secs(30))
            .count();
        assert!(in_window <= 3, "{in_window} acquisitions inside one window");
    }
    assert_eq!(issued.last().unwrap().duration_since(start), Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn test_config_spacing_applies_between_requests() {
    let config = ArchiveConfig {
        max_requests_per_hour: 100,
        delay_between_requests: Duration::from_millis(1500),
        ..ArchiveConfig::default()
    };
    let limiter = RateLimiter::from_config(&config).unwrap();
    let start = Instant::now();

    limiter.acquire().await;
    limiter.acquire().await;
    limiter.acquire().await;

    assert_eq!(start.elapsed(), Duration::from_millis(3000));
    assert_eq!(limiter.max_requests(), 100);
    assert_eq!(limiter.window(), Duration::from_secs(3600));
}

#[tokio::test(start_paused = true)]
async fn test_idle_period_restores_full_budget() {
    let limiter = RateLimiter::new(2, Duration::from_secs(10)).unwrap();

    limiter.acquire().await;
    limiter.acquire().await;
    tokio::time::advance(Duration::from_secs(11)).await;

    assert_eq!(limiter.in_window().await, 0);
    assert_eq!(limiter.acquire().await, Duration::ZERO);
}

#[test]
fn test_zero_budget_is_rejected() {
    assert!(RateLimiter::new(0, Duration::from_secs(1)).is_err());
    assert!(RateLimiter::new(1, Duration::ZERO).is_err());
}
