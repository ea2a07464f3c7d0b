//! Behaviour with a broken store

use super::StubFetcher;
use crate::clock::ManualClock;
use crate::core::ResourceCache;
use crate::entry::Payload;
use crate::errors::StoreType;
use crate::fetch::FetchOptions;
use crate::kind::ResourceKind;
use crate::storage::{DiskStore, UnavailableStore};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

fn broken_cache(fetcher: &StubFetcher) -> ResourceCache {
    ResourceCache::builder()
        .store(UnavailableStore::new("backend rejected every transaction"))
        .fetcher(fetcher.clone())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_every_operation_degrades() {
    let cache = broken_cache(&StubFetcher::ok("unused"));
    let key = "https://x/model.onnx";

    assert!(!cache.put(key, vec![1u8; 4], ResourceKind::Model).await);
    assert_eq!(cache.get(key).await, None);
    assert!(!cache.delete(key).await);
    assert_eq!(cache.purge_expired().await, 0);
    assert!(!cache.clear().await);
    assert_eq!(cache.stats().await.count, 0);
    assert!(cache.entries().await.is_empty());
    assert_eq!(cache.initialize().await.purged, 0);
    assert_eq!(cache.store_type(), StoreType::Unavailable);
    assert!(cache.counters().errors >= 7);
}

#[tokio::test]
async fn test_intercept_falls_through_to_network() {
    let fetcher = StubFetcher::ok(vec![5u8; 32]);
    let cache = broken_cache(&fetcher);
    let url = "https://cdn.example/ort.wasm";

    for _ in 0..2 {
        let response = cache.intercept_fetch(url, &FetchOptions::default()).await.unwrap();
        assert_eq!(response.bytes().len(), 32);
        assert!(!response.is_from_cache());
        cache.flush().await;
    }
    assert_eq!(fetcher.calls(), 2);
}

fn object_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for shard in std::fs::read_dir(dir.join("objects")).unwrap() {
        for file in std::fs::read_dir(shard.unwrap().path()).unwrap() {
            files.push(file.unwrap().path());
        }
    }
    files
}

#[tokio::test]
async fn test_damaged_entry_reads_as_miss_and_is_dropped() {
    let temp_dir = TempDir::new().unwrap();
    let cache = ResourceCache::builder()
        .store(DiskStore::open(temp_dir.path()).await.unwrap())
        .fetcher(StubFetcher::ok("unused"))
        .build()
        .unwrap();
    let key = "https://x/weights.bin";
    assert!(cache.put(key, Payload::from(vec![1u8; 64]), ResourceKind::Data).await);

    let objects = object_files(temp_dir.path());
    assert_eq!(objects.len(), 1);
    std::fs::write(&objects[0], vec![2u8; 64]).unwrap();

    assert_eq!(cache.get(key).await, None);
    assert_eq!(cache.stats().await.count, 0);
    assert_eq!(cache.counters().errors, 1);
}

#[tokio::test]
async fn test_purge_survives_garbage_sidecar() {
    let temp_dir = TempDir::new().unwrap();
    let cache = ResourceCache::builder()
        .store(DiskStore::open(temp_dir.path()).await.unwrap())
        .fetcher(StubFetcher::ok("unused"))
        .build()
        .unwrap();
    let key = "https://x/weights.bin";
    assert!(cache.put(key, Payload::from(vec![1u8; 8]), ResourceKind::Data).await);

    let stray = temp_dir.path().join("metadata").join("zz");
    std::fs::create_dir_all(&stray).unwrap();
    std::fs::write(stray.join("x.meta"), "garbage").unwrap();

    assert_eq!(cache.purge_expired().await, 0);
    assert!(!stray.join("x.meta").exists());
    assert_eq!(cache.get(key).await, Some(Payload::from(vec![1u8; 8])));
}

#[tokio::test]
async fn test_rewrite_keeps_single_object() {
    let temp_dir = TempDir::new().unwrap();
    let cache = ResourceCache::builder()
        .store(DiskStore::open(temp_dir.path()).await.unwrap())
        .fetcher(StubFetcher::ok("unused"))
        .build()
        .unwrap();
    let key = "https://x/weights.bin";

    assert!(cache.put(key, Payload::from(vec![1u8; 64]), ResourceKind::Data).await);
    assert!(cache.put(key, Payload::from(vec![2u8; 32]), ResourceKind::Data).await);

    assert_eq!(object_files(temp_dir.path()).len(), 1);
    assert_eq!(cache.get(key).await, Some(Payload::from(vec![2u8; 32])));
}

#[tokio::test]
async fn test_expired_payload_is_not_read() {
    let temp_dir = TempDir::new().unwrap();
    let clock = ManualClock::new(1_700_000_000_000);
    let cache = ResourceCache::builder()
        .store(DiskStore::open(temp_dir.path()).await.unwrap())
        .fetcher(StubFetcher::ok("unused"))
        .clock(clock.clone())
        .build()
        .unwrap();
    let key = "https://x/weights.bin";
    assert!(cache.put(key, Payload::from(vec![1u8; 64]), ResourceKind::Data).await);

    // A damaged payload would count as an error if it were read
    let objects = object_files(temp_dir.path());
    std::fs::write(&objects[0], vec![2u8; 64]).unwrap();
    clock.advance(Duration::from_secs(8 * 24 * 60 * 60));

    assert_eq!(cache.get(key).await, None);
    let counters = cache.counters();
    assert_eq!(counters.errors, 0);
    assert_eq!(counters.expired, 1);
    assert_eq!(cache.stats().await.count, 0);
}
