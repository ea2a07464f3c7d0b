//! Cache-first fetch tests

use super::StubFetcher;
use crate::clock::ManualClock;
use crate::core::ResourceCache;
use crate::entry::Payload;
use crate::errors::CacheError;
use crate::events::CacheEvent;
use crate::fetch::{FetchOptions, FetchStrategy, ResponseSource};
use crate::kind::ResourceKind;
use crate::storage::MemoryStore;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::time::Duration;

const EIGHT_DAYS: Duration = Duration::from_secs(8 * 24 * 60 * 60);

fn stale_on_error() -> FetchOptions {
    FetchOptions::default().with_strategy(FetchStrategy::CacheFirstStaleOnError)
}

fn cache_with_clock(fetcher: &StubFetcher, clock: &ManualClock) -> ResourceCache {
    ResourceCache::builder()
        .store(MemoryStore::new())
        .fetcher(fetcher.clone())
        .clock(clock.clone())
        .build()
        .unwrap()
}

fn cache_with(fetcher: &StubFetcher) -> ResourceCache {
    ResourceCache::builder()
        .store(MemoryStore::new())
        .fetcher(fetcher.clone())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_miss_fetches_once_then_hits() {
    let fetcher = StubFetcher::ok(vec![7u8; 1024]);
    let cache = cache_with(&fetcher);
    let url = "https://cdn.example/models/isnet.onnx";

    let first = cache.intercept_fetch(url, &FetchOptions::default()).await.unwrap();
    assert_eq!(first.source(), ResponseSource::Network);
    assert_eq!(first.bytes().len(), 1024);
    cache.flush().await;

    let second = cache.intercept_fetch(url, &FetchOptions::default()).await.unwrap();
    assert!(second.is_from_cache());
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(second.bytes(), first.bytes());
    assert_eq!(
        second.headers()[CONTENT_TYPE],
        "application/octet-stream"
    );

    assert_eq!(fetcher.calls(), 1);
    let stats = cache.stats().await;
    assert_eq!(stats.count, 1);
    assert_eq!(stats.by_kind.get(&ResourceKind::Model), Some(&1));
}

#[tokio::test]
async fn test_hit_avoids_network() {
    let fetcher = StubFetcher::unreachable();
    let cache = cache_with(&fetcher);
    let url = "https://cdn.example/ort-wasm-simd.wasm";
    assert!(cache.put(url, vec![0u8; 16], ResourceKind::Wasm).await);

    let response = cache.intercept_fetch(url, &FetchOptions::default()).await.unwrap();
    assert!(response.is_from_cache());
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_cached_text_keeps_its_content_type() {
    let fetcher = StubFetcher::unreachable();
    let cache = cache_with(&fetcher);
    let url = "https://cdn.example/config";
    assert!(cache.put(url, Payload::from("{}"), ResourceKind::Unknown).await);

    let response = cache.intercept_fetch(url, &FetchOptions::default()).await.unwrap();
    assert_eq!(response.text().unwrap(), "{}");
    assert!(response.headers()[CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
}

#[tokio::test]
async fn test_unsuccessful_response_is_returned_but_not_cached() {
    let fetcher = StubFetcher::with_status(StatusCode::NOT_FOUND, "missing");
    let cache = cache_with(&fetcher);
    let url = "https://cdn.example/gone.bin";

    let response = cache.intercept_fetch(url, &FetchOptions::default()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    cache.flush().await;

    assert_eq!(cache.stats().await.count, 0);
    cache.intercept_fetch(url, &FetchOptions::default()).await.unwrap();
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn test_network_failure_is_propagated() {
    let fetcher = StubFetcher::unreachable();
    let cache = cache_with(&fetcher);

    let err = cache
        .intercept_fetch("https://cdn.example/model.onnx", &FetchOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CacheError::Network { .. }));
    assert_eq!(cache.stats().await.count, 0);
}

#[tokio::test]
async fn test_expired_entry_is_refetched() {
    let clock = ManualClock::new(1_700_000_000_000);
    let fetcher = StubFetcher::ok(vec![3u8; 8]);
    let cache = ResourceCache::builder()
        .store(MemoryStore::new())
        .fetcher(fetcher.clone())
        .clock(clock.clone())
        .build()
        .unwrap();
    let url = "https://cdn.example/data.bin";

    cache.intercept_fetch(url, &FetchOptions::default()).await.unwrap();
    cache.flush().await;
    clock.advance(Duration::from_secs(8 * 24 * 60 * 60));

    let response = cache.intercept_fetch(url, &FetchOptions::default()).await.unwrap();
    assert_eq!(response.source(), ResponseSource::Network);
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn test_flush_without_pending_writes_returns() {
    let cache = cache_with(&StubFetcher::ok("x"));
    cache.flush().await;
}

#[tokio::test]
async fn test_stale_entry_served_when_network_fails() {
    let clock = ManualClock::new(1_700_000_000_000);
    let fetcher = StubFetcher::unreachable();
    let cache = cache_with_clock(&fetcher, &clock);
    let url = "https://cdn.example/models/isnet.onnx";
    assert!(cache.put(url, vec![9u8; 64], ResourceKind::Model).await);
    clock.advance(EIGHT_DAYS);

    let response = cache.intercept_fetch(url, &stale_on_error()).await.unwrap();
    assert_eq!(response.source(), ResponseSource::StaleCache);
    assert_eq!(response.bytes().len(), 64);
    assert_eq!(fetcher.calls(), 1);

    // Still there for the next failure; only a purge or a refresh removes it
    assert_eq!(cache.stats().await.count, 1);
    assert!(cache.get(url).await.is_none());
    assert_eq!(cache.stats().await.count, 0);
}

#[tokio::test]
async fn test_stale_entry_served_on_error_status() {
    let clock = ManualClock::new(1_700_000_000_000);
    let fetcher = StubFetcher::with_status(StatusCode::SERVICE_UNAVAILABLE, "busy");
    let cache = cache_with_clock(&fetcher, &clock);
    let url = "https://cdn.example/ort.wasm";
    assert!(cache.put(url, vec![1u8; 8], ResourceKind::Wasm).await);
    clock.advance(EIGHT_DAYS);

    let response = cache.intercept_fetch(url, &stale_on_error()).await.unwrap();
    assert!(response.is_stale());
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_expired_entry_is_not_a_fallback_by_default() {
    let clock = ManualClock::new(1_700_000_000_000);
    let fetcher = StubFetcher::unreachable();
    let cache = cache_with_clock(&fetcher, &clock);
    let url = "https://cdn.example/models/isnet.onnx";
    assert!(cache.put(url, vec![9u8; 64], ResourceKind::Model).await);
    clock.advance(EIGHT_DAYS);

    let err = cache
        .intercept_fetch(url, &FetchOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_network());
    assert_eq!(cache.stats().await.count, 0);
}

#[tokio::test]
async fn test_stale_strategy_without_entry_propagates_failure() {
    let fetcher = StubFetcher::unreachable();
    let cache = cache_with(&fetcher);

    let err = cache
        .intercept_fetch("https://cdn.example/data.bin", &stale_on_error())
        .await
        .unwrap_err();
    assert!(matches!(err, CacheError::Network { .. }));
}

#[tokio::test]
async fn test_fetch_publishes_events() {
    let fetcher = StubFetcher::ok(vec![4u8; 100]);
    let cache = cache_with(&fetcher);
    let mut events = cache.subscribe();
    let url = "https://cdn.example/models/isnet.onnx";

    cache.intercept_fetch(url, &FetchOptions::default()).await.unwrap();
    cache.flush().await;
    cache.intercept_fetch(url, &FetchOptions::default()).await.unwrap();

    let url = url.to_string();
    assert_eq!(
        events.try_recv().unwrap(),
        CacheEvent::DownloadStarted { url: url.clone() }
    );
    assert_eq!(
        events.try_recv().unwrap(),
        CacheEvent::Stored {
            url: url.clone(),
            bytes: 100
        }
    );
    assert_eq!(
        events.try_recv().unwrap(),
        CacheEvent::Hit { url, bytes: 100 }
    );
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_failures_publish_events() {
    let clock = ManualClock::new(1_700_000_000_000);
    let cache = cache_with_clock(&StubFetcher::unreachable(), &clock);
    let url = "https://cdn.example/data.bin";
    assert!(cache.put(url, vec![2u8; 10], ResourceKind::Data).await);
    clock.advance(EIGHT_DAYS);
    let mut events = cache.subscribe();

    cache.intercept_fetch(url, &stale_on_error()).await.unwrap();

    assert!(matches!(events.try_recv().unwrap(), CacheEvent::DownloadStarted { .. }));
    assert!(matches!(events.try_recv().unwrap(), CacheEvent::DownloadFailed { .. }));
    assert_eq!(
        events.try_recv().unwrap(),
        CacheEvent::StaleServed {
            url: url.to_string(),
            bytes: 10
        }
    );
}
