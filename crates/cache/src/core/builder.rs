//! Cache builder and initialization

use crate::clock::{Clock, SystemClock};
use crate::config::{CacheConfig, StoreBackend};
use crate::errors::{CacheError, RecoveryHint, Result};
use crate::events::EVENT_CHANNEL_CAPACITY;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::storage::{DiskStore, MemoryStore, ResourceStore, UnavailableStore};
use assetcache_core::DEFAULT_RETENTION;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use super::internal::CacheStats;
use super::types::{CacheInner, ResourceCache};

/// Assembles a [`ResourceCache`] from its collaborators
///
/// Unset parts default to an in-memory store, an [`HttpFetcher`], the system
/// clock and a seven day retention window.
#[derive(Debug, Default)]
pub struct ResourceCacheBuilder {
    store: Option<Arc<dyn ResourceStore>>,
    fetcher: Option<Arc<dyn Fetcher>>,
    clock: Option<Arc<dyn Clock>>,
    retention: Option<Duration>,
}

impl ResourceCacheBuilder {
    pub fn store(mut self, store: impl ResourceStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    pub fn shared_store(mut self, store: Arc<dyn ResourceStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    pub fn shared_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    pub fn retention(mut self, retention: Duration) -> Self {
        self.retention = Some(retention);
        self
    }

    pub fn build(self) -> Result<ResourceCache> {
        let retention = self.retention.unwrap_or(DEFAULT_RETENTION);
        if retention.is_zero() {
            return Err(CacheError::Configuration {
                message: "Retention window must be greater than zero".to_string(),
                recovery_hint: RecoveryHint::UpdateConfiguration,
            });
        }

        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => match HttpFetcher::new() {
                Ok(fetcher) => Arc::new(fetcher) as Arc<dyn Fetcher>,
                Err(e) => return Err(e),
            },
        };

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn ResourceStore>);
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let inner = Arc::new(CacheInner {
            store,
            fetcher,
            clock,
            retention_millis: retention.as_millis() as u64,
            stats: CacheStats::default(),
            pending: Mutex::new(Vec::new()),
            events,
        });

        Ok(ResourceCache { inner })
    }
}

impl ResourceCache {
    pub fn builder() -> ResourceCacheBuilder {
        ResourceCacheBuilder::default()
    }

    /// Open the cache described by `config`
    ///
    /// A disk store that cannot be opened is replaced by an
    /// [`UnavailableStore`]: the cache then misses on every call and all
    /// traffic goes to the network. Only an unusable HTTP client or an
    /// invalid retention window is an error.
    pub async fn open(config: &CacheConfig) -> Result<Self> {
        let store: Arc<dyn ResourceStore> = if !config.enabled {
            tracing::info!("caching disabled, every fetch goes to the network");
            Arc::new(UnavailableStore::new("caching disabled by configuration"))
        } else {
            match config.store {
                StoreBackend::Memory => Arc::new(MemoryStore::new()),
                StoreBackend::Disk => match DiskStore::open(&config.base_dir).await {
                    Ok(store) => Arc::new(store),
                    Err(e) => {
                        tracing::warn!(
                            base_dir = %config.base_dir.display(),
                            error = %e,
                            "cannot open cache directory, continuing without cache"
                        );
                        Arc::new(UnavailableStore::new(e.to_string()))
                    }
                },
            }
        };

        let fetcher = match HttpFetcher::with_settings(config.fetch_timeout, &config.user_agent) {
            Ok(fetcher) => fetcher,
            Err(e) => return Err(e),
        };

        Self::builder()
            .shared_store(store)
            .fetcher(fetcher)
            .retention(config.retention)
            .build()
    }
}
