//! Resource cache for assetcache
//!
//! This crate provides an expiring cache of network-fetched assets:
//! - Cache-first fetching with background stores and change events
//! - Memory and sharded disk stores with integrity checks
//! - Fail-soft behaviour on every store error
//! - Persisted warm state and a single-flight asset preloader

pub mod clock;
pub mod config;
pub mod core;
pub mod entry;
pub mod errors;
pub mod events;
pub mod fetch;
pub mod kind;
pub mod preload;
pub mod state;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, CacheConfigLoader, CacheConfigOverrides, ConfigSource, StoreBackend};
pub use core::internal::CacheCounters;
pub use core::{HousekeepingReport, ResourceCache, ResourceCacheBuilder, ResourceStats};
pub use entry::{CacheEntry, EntryMetadata, Payload, PayloadEncoding};
pub use errors::{CacheError, Error, RecoveryHint, Result};
pub use events::CacheEvent;
pub use fetch::{
    FetchOptions, FetchResponse, FetchStrategy, Fetcher, HttpFetcher, ResponseSource,
};
pub use kind::ResourceKind;
pub use preload::{AssetPreloader, AssetReport, PreloadReport, PreloadStatus};
pub use state::{WarmCacheStats, WarmSnapshot, WarmState};
pub use storage::{DiskStore, MemoryStore, ResourceStore, UnavailableStore};
