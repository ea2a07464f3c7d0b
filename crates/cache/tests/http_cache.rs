//! End-to-end tests: real HTTP fetches through a disk-backed cache

use assetcache_cache::{
    CacheConfig, CacheError, DiskStore, FetchOptions, HttpFetcher, ResourceCache, ResourceKind,
    ResponseSource, StoreBackend,
};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn disk_cache(dir: &TempDir) -> ResourceCache {
    ResourceCache::builder()
        .store(DiskStore::open(dir.path()).await.unwrap())
        .fetcher(HttpFetcher::new().unwrap())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_second_fetch_is_served_from_disk() {
    let server = MockServer::start().await;
    let weights = vec![42u8; 256 * 1024];
    Mock::given(method("GET"))
        .and(path("/models/u2netp.onnx"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(weights.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let url = format!("{}/models/u2netp.onnx", server.uri());

    let cache = disk_cache(&temp_dir).await;
    let first = cache.intercept_fetch(&url, &FetchOptions::default()).await.unwrap();
    assert_eq!(first.source(), ResponseSource::Network);
    cache.flush().await;

    // A fresh handle on the same directory sees the stored entry
    let reopened = disk_cache(&temp_dir).await;
    let second = reopened
        .intercept_fetch(&url, &FetchOptions::default())
        .await
        .unwrap();
    assert!(second.is_from_cache());
    assert_eq!(second.bytes().as_ref(), weights.as_slice());

    let stats = reopened.stats().await;
    assert_eq!(stats.count, 1);
    assert_eq!(stats.total_bytes, weights.len() as u64);
    assert_eq!(stats.by_kind.get(&ResourceKind::Model), Some(&1));
}

#[tokio::test]
async fn test_server_errors_are_passed_through_uncached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ort-wasm.wasm"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(2)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let cache = disk_cache(&temp_dir).await;
    let url = format!("{}/ort-wasm.wasm", server.uri());

    for _ in 0..2 {
        let response = cache.intercept_fetch(&url, &FetchOptions::default()).await.unwrap();
        assert_eq!(response.status().as_u16(), 500);
        assert_eq!(response.text().unwrap(), "boom");
        cache.flush().await;
    }
    assert_eq!(cache.stats().await.count, 0);
}

#[tokio::test]
async fn test_unreachable_host_surfaces_network_error() {
    let temp_dir = TempDir::new().unwrap();
    let cache = disk_cache(&temp_dir).await;

    // Nothing listens on port 9 (discard) on a test machine
    let result = cache
        .intercept_fetch(
            "http://127.0.0.1:9/model.onnx",
            &FetchOptions::default().with_timeout(Duration::from_secs(5)),
        )
        .await;

    assert!(matches!(
        result,
        Err(CacheError::Network { .. }) | Err(CacheError::Timeout { .. })
    ));
}

#[tokio::test]
async fn test_open_falls_back_when_directory_is_unusable() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file in the way").unwrap();

    let config = CacheConfig {
        base_dir: blocker.join("cache"),
        store: StoreBackend::Disk,
        ..CacheConfig::default()
    };
    let cache = ResourceCache::open(&config).await.unwrap();

    assert!(!cache.put("https://x/a.js", "a", ResourceKind::Script).await);
    assert_eq!(cache.get("https://x/a.js").await, None);
}

#[tokio::test]
async fn test_disabled_cache_always_fetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/app.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string("main()"))
        .expect(2)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let config = CacheConfig {
        enabled: false,
        base_dir: temp_dir.path().to_path_buf(),
        ..CacheConfig::default()
    };
    let cache = ResourceCache::open(&config).await.unwrap();
    let url = format!("{}/app.js", server.uri());

    for _ in 0..2 {
        let response = cache.intercept_fetch(&url, &FetchOptions::default()).await.unwrap();
        assert!(!response.is_from_cache());
        cache.flush().await;
    }
}
