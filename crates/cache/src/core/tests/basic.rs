//! Basic cache operation tests

use super::StubFetcher;
use crate::core::ResourceCache;
use crate::entry::Payload;
use crate::kind::ResourceKind;
use crate::storage::{DiskStore, MemoryStore};
use serde_json::json;
use std::collections::BTreeMap;
use tempfile::TempDir;

fn memory_cache() -> ResourceCache {
    ResourceCache::builder()
        .store(MemoryStore::new())
        .fetcher(StubFetcher::ok("unused"))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_round_trip_each_payload_variant() {
    let cache = memory_cache();

    let binary = Payload::from(vec![0u8, 1, 2, 3]);
    let text = Payload::from("export default 1;");
    let value = Payload::from(json!({"labels": ["background", "foreground"]}));

    assert!(cache.put("https://x/ort.wasm", binary.clone(), ResourceKind::Wasm).await);
    assert!(cache.put("https://x/app.js", text.clone(), ResourceKind::Script).await);
    assert!(cache.put("https://x/labels", value.clone(), ResourceKind::Data).await);

    assert_eq!(cache.get("https://x/ort.wasm").await, Some(binary));
    assert_eq!(cache.get("https://x/app.js").await, Some(text));
    assert_eq!(cache.get("https://x/labels").await, Some(value));
    assert_eq!(cache.get("https://x/missing").await, None);

    let counters = cache.counters();
    assert_eq!(counters.hits, 3);
    assert_eq!(counters.misses, 1);
    assert_eq!(counters.writes, 3);
}

#[tokio::test]
async fn test_overwrite_keeps_one_entry() {
    let cache = memory_cache();
    let key = "https://x/model.onnx";

    assert!(cache.put(key, vec![1u8; 10], ResourceKind::Model).await);
    assert!(cache.put(key, vec![2u8; 20], ResourceKind::Model).await);

    assert_eq!(cache.get(key).await, Some(Payload::from(vec![2u8; 20])));
    let stats = cache.stats().await;
    assert_eq!(stats.count, 1);
    assert_eq!(stats.total_bytes, 20);
}

#[tokio::test]
async fn test_stats_breakdown_by_kind() {
    let cache = memory_cache();
    assert!(cache.put("https://x/a.wasm", vec![0u8; 100], ResourceKind::Wasm).await);
    assert!(cache.put("https://x/b.wasm", vec![0u8; 50], ResourceKind::Wasm).await);
    assert!(cache.put("https://x/model.onnx", vec![0u8; 1000], ResourceKind::Model).await);

    let stats = cache.stats().await;
    assert_eq!(stats.count, 3);
    assert_eq!(stats.total_bytes, 1150);
    assert_eq!(
        stats.by_kind,
        BTreeMap::from([(ResourceKind::Wasm, 2), (ResourceKind::Model, 1)])
    );
    assert_eq!(stats.formatted_size(), "1.12 KB");
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let cache = memory_cache();
    let key = "https://x/app.js";
    assert!(cache.put(key, "code", ResourceKind::Script).await);

    assert!(cache.delete(key).await);
    assert!(cache.delete(key).await);
    assert_eq!(cache.get(key).await, None);
    assert_eq!(cache.counters().removals, 1);
}

#[tokio::test]
async fn test_clear_and_entries() {
    let cache = memory_cache();
    assert!(cache.put("https://x/b.bin", vec![1u8], ResourceKind::Data).await);
    assert!(cache.put("https://x/a.js", "a", ResourceKind::Script).await);

    let keys: Vec<_> = cache.entries().await.into_iter().map(|m| m.key).collect();
    assert_eq!(keys, vec!["https://x/a.js", "https://x/b.bin"]);

    assert!(cache.clear().await);
    assert_eq!(cache.stats().await.count, 0);
    assert!(cache.entries().await.is_empty());
}

#[tokio::test]
async fn test_empty_key_is_rejected() {
    let cache = memory_cache();
    assert!(!cache.put("", "x", ResourceKind::Unknown).await);
    assert_eq!(cache.stats().await.count, 0);
    assert_eq!(cache.counters().errors, 1);
}

#[tokio::test]
async fn test_disk_backed_cache_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let key = "https://x/u2net.onnx";

    {
        let store = DiskStore::open(temp_dir.path()).await.unwrap();
        let cache = ResourceCache::builder()
            .store(store)
            .fetcher(StubFetcher::ok("unused"))
            .build()
            .unwrap();
        assert!(cache.put(key, vec![9u8; 4096], ResourceKind::Model).await);
    }

    let store = DiskStore::open(temp_dir.path()).await.unwrap();
    let cache = ResourceCache::builder()
        .store(store)
        .fetcher(StubFetcher::ok("unused"))
        .build()
        .unwrap();
    assert_eq!(cache.get(key).await, Some(Payload::from(vec![9u8; 4096])));
}

#[test]
fn test_zero_retention_is_rejected() {
    let result = ResourceCache::builder()
        .fetcher(StubFetcher::ok("unused"))
        .retention(std::time::Duration::ZERO)
        .build();
    assert!(result.is_err());
}
