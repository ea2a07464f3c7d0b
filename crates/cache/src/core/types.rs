//! Core cache types and structures

use crate::clock::Clock;
use crate::errors::{CacheError, StoreType};
use crate::events::CacheEvent;
use crate::fetch::Fetcher;
use crate::storage::ResourceStore;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::internal::CacheStats;

/// Fail-soft cache of network resources
///
/// Cloning is cheap; clones share the same store, counters and pending
/// background writes.
#[derive(Clone)]
pub struct ResourceCache {
    pub(super) inner: Arc<CacheInner>,
}

pub(super) struct CacheInner {
    /// Backing store
    pub store: Arc<dyn ResourceStore>,
    /// Real fetch path used on a miss
    pub fetcher: Arc<dyn Fetcher>,
    pub clock: Arc<dyn Clock>,
    /// Retention window in milliseconds
    pub retention_millis: u64,
    pub stats: CacheStats,
    /// Background stores spawned by `intercept_fetch`
    pub pending: Mutex<Vec<JoinHandle<()>>>,
    pub events: broadcast::Sender<CacheEvent>,
}

impl ResourceCache {
    pub fn retention_millis(&self) -> u64 {
        self.inner.retention_millis
    }

    pub fn store_type(&self) -> StoreType {
        self.inner.store.store_type()
    }

    /// Receive the events published from now on
    ///
    /// A subscriber that falls more than
    /// [`EVENT_CHANNEL_CAPACITY`](crate::events::EVENT_CHANNEL_CAPACITY)
    /// events behind skips the oldest ones.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.inner.events.subscribe()
    }

    pub(super) fn emit(&self, event: CacheEvent) {
        if self.inner.events.receiver_count() == 0 {
            return;
        }
        if let Err(e) = self.inner.events.send(event) {
            tracing::debug!("Failed to send cache event: {}", e);
        }
    }

    pub(super) fn now(&self) -> u64 {
        self.inner.clock.now_millis()
    }

    /// Count and log a swallowed store failure
    pub(super) fn report_failure(&self, operation: &'static str, key: &str, error: &CacheError) {
        self.inner.stats.record_error();
        match error {
            // Expected when caching is disabled or the store could not be opened
            CacheError::StoreUnavailable { .. } => {
                tracing::debug!(operation, key, error = %error, "cache store unavailable");
            }
            _ => {
                tracing::warn!(
                    operation,
                    key,
                    error = %error,
                    hint = ?error.recovery_hint(),
                    "cache operation failed, continuing without cache"
                );
            }
        }
    }
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("store", &self.inner.store)
            .field("fetcher", &self.inner.fetcher)
            .field("retention_millis", &self.inner.retention_millis)
            .field("pending_writes", &self.inner.pending.lock().len())
            .finish()
    }
}
