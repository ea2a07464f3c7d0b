//! Property-based tests for cache invariants

use assetcache_cache::{
    DiskStore, ManualClock, MemoryStore, Payload, ResourceCache, ResourceKind,
};
use proptest::prelude::*;
use std::time::Duration;
use tempfile::TempDir;
use tokio::runtime::Runtime;

const START: u64 = 1_700_000_000_000;

fn arb_url() -> impl Strategy<Value = String> {
    (
        "[a-z]{1,12}",
        "[a-zA-Z0-9_-]{1,20}(/[a-zA-Z0-9_.-]{1,20}){0,4}",
    )
        .prop_map(|(host, path)| format!("https://{host}.example/{path}"))
}

fn arb_payload() -> impl Strategy<Value = Payload> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 0..4096).prop_map(Payload::from),
        ".{0,256}".prop_map(Payload::from),
        (any::<i64>(), "[a-z]{0,16}")
            .prop_map(|(n, s)| Payload::from(serde_json::json!({ "n": n, "s": s }))),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn disk_store_returns_what_was_put(url in arb_url(), payload in arb_payload()) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let temp_dir = TempDir::new().unwrap();
            let cache = ResourceCache::builder()
                .store(DiskStore::open(temp_dir.path()).await.unwrap())
                .build()
                .unwrap();

            let size = payload.byte_size().unwrap();
            let kind = ResourceKind::classify(&url);
            prop_assert!(cache.put(&url, payload.clone(), kind).await);
            prop_assert_eq!(cache.get(&url).await, Some(payload));

            let stats = cache.stats().await;
            prop_assert_eq!(stats.count, 1);
            prop_assert_eq!(stats.total_bytes, size);
            prop_assert_eq!(stats.by_kind.get(&kind).copied(), Some(1));
            Ok(())
        })?;
    }

    #[test]
    fn entries_expire_exactly_at_the_retention_window(
        retention_secs in 1u64..30 * 24 * 60 * 60,
        elapsed_secs in 0u64..60 * 24 * 60 * 60,
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let clock = ManualClock::new(START);
            let cache = ResourceCache::builder()
                .store(MemoryStore::new())
                .clock(clock.clone())
                .retention(Duration::from_secs(retention_secs))
                .build()
                .unwrap();

            let url = "https://x.example/model.onnx";
            prop_assert!(cache.put(url, vec![1u8; 16], ResourceKind::Model).await);
            clock.advance(Duration::from_secs(elapsed_secs));

            let hit = cache.get(url).await.is_some();
            prop_assert_eq!(hit, elapsed_secs < retention_secs);
            prop_assert_eq!(cache.stats().await.count, u64::from(hit));
            Ok(())
        })?;
    }
}
