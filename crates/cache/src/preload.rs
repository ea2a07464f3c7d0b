//! Background asset preloading
//!
//! [`AssetPreloader`] warms the cache with a fixed list of assets so later
//! fetches are served locally. At most one preload runs at a time; callers
//! arriving while one is in flight share its outcome.

use crate::core::ResourceCache;
use crate::errors::{CacheError, RecoveryHint, Result};
use crate::fetch::{FetchOptions, FetchStrategy, ResponseSource};
use crate::state::{WarmCacheStats, WarmState};
use assetcache_utils::{format_bytes, format_speed};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// One fetched asset
#[derive(Debug, Clone, PartialEq)]
pub struct AssetReport {
    pub url: String,
    pub bytes: u64,
    pub source: ResponseSource,
    pub elapsed: Duration,
}

/// Outcome of a successful preload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreloadReport {
    pub assets: Vec<AssetReport>,
    /// Expired entries removed by the housekeeping pass
    pub purged: usize,
    pub elapsed: Duration,
}

impl PreloadReport {
    pub fn total_bytes(&self) -> u64 {
        self.assets.iter().map(|asset| asset.bytes).sum()
    }

    pub fn served_from_cache(&self) -> usize {
        self.assets
            .iter()
            .filter(|asset| asset.source.is_cache())
            .count()
    }

    /// Assets that were only available as expired entries
    pub fn served_stale(&self) -> usize {
        self.assets
            .iter()
            .filter(|asset| asset.source == ResponseSource::StaleCache)
            .count()
    }
}

/// Preloader lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum PreloadStatus {
    Idle,
    Running,
    Ready(PreloadReport),
    Failed(String),
}

/// Fetches a set of assets through the cache once
///
/// Clones share the same status, so a clone handed to another task joins
/// the same preload.
#[derive(Clone)]
pub struct AssetPreloader {
    cache: ResourceCache,
    urls: Arc<[String]>,
    options: FetchOptions,
    warm_state: Option<Arc<WarmState>>,
    status: Arc<watch::Sender<PreloadStatus>>,
}

/// Marks an abandoned run as failed so waiters are released
struct RunGuard<'a> {
    status: &'a watch::Sender<PreloadStatus>,
    finished: bool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.status
                .send_replace(PreloadStatus::Failed("preload cancelled".to_string()));
        }
    }
}

impl AssetPreloader {
    pub fn new(cache: ResourceCache, urls: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let (status, _) = watch::channel(PreloadStatus::Idle);
        Self {
            cache,
            urls: urls.into_iter().map(Into::into).collect(),
            options: FetchOptions::default(),
            warm_state: None,
            status: Arc::new(status),
        }
    }

    /// Record readiness in `state` after each successful preload
    pub fn with_warm_state(mut self, state: Arc<WarmState>) -> Self {
        self.warm_state = Some(state);
        self
    }

    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn status(&self) -> PreloadStatus {
        self.status.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.status.borrow(), PreloadStatus::Ready(_))
    }

    /// Run the preload, or join the one already running
    ///
    /// A completed preload is not repeated; a failed one is retried.
    pub async fn start(&self) -> Result<PreloadReport> {
        let mut changes = self.status.subscribe();
        let claimed = self.status.send_if_modified(|status| match status {
            PreloadStatus::Idle | PreloadStatus::Failed(_) => {
                *status = PreloadStatus::Running;
                true
            }
            PreloadStatus::Running | PreloadStatus::Ready(_) => false,
        });

        if claimed {
            return self.run().await;
        }

        debug!("joining preload already in progress");
        loop {
            let current = changes.borrow_and_update().clone();
            match current {
                PreloadStatus::Ready(report) => return Ok(report),
                PreloadStatus::Failed(reason) => return Err(preload_failed(&self.urls, reason)),
                PreloadStatus::Idle | PreloadStatus::Running => {}
            }
            if changes.changed().await.is_err() {
                return Err(preload_failed(&self.urls, "preloader dropped".to_string()));
            }
        }
    }

    /// `true` once ready; waits for a preload in flight, `false` when no
    /// preload has succeeded
    pub async fn wait_until_ready(&self) -> bool {
        let mut changes = self.status.subscribe();
        loop {
            match *changes.borrow_and_update() {
                PreloadStatus::Ready(_) => return true,
                PreloadStatus::Idle | PreloadStatus::Failed(_) => return false,
                PreloadStatus::Running => {}
            }
            if changes.changed().await.is_err() {
                return false;
            }
        }
    }

    /// Start a preload after `delay` on the runtime
    pub fn schedule(&self, delay: Duration) -> JoinHandle<()> {
        let preloader = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match preloader.start().await {
                Ok(report) => debug!(assets = report.assets.len(), "scheduled preload finished"),
                Err(e) => warn!(error = %e, "scheduled preload failed"),
            }
        })
    }

    async fn run(&self) -> Result<PreloadReport> {
        let mut guard = RunGuard {
            status: &*self.status,
            finished: false,
        };
        let cache = &self.cache;
        let started = Instant::now();
        info!(assets = self.urls.len(), "preloading assets");

        // Expired entries are the fallback under this strategy, so they are
        // only purged once every asset has been fetched
        let stale_on_error = self.options.strategy == FetchStrategy::CacheFirstStaleOnError;
        let purged_early = if stale_on_error {
            0
        } else {
            cache.initialize().await.purged
        };

        let fetches = self.urls.iter().map(|url| async move {
            let fetch_started = Instant::now();
            let result = cache.intercept_fetch(url, &self.options).await;
            (url, result, fetch_started.elapsed())
        });
        let results = join_all(fetches).await;

        let mut assets = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (url, result, elapsed) in results {
            match result {
                Ok(response) if response.is_success() => {
                    let bytes = response.bytes().len() as u64;
                    debug!(
                        url = %url,
                        size = %format_bytes(bytes),
                        speed = %format_speed(bytes, elapsed.as_millis() as u64),
                        from_cache = response.is_from_cache(),
                        "asset ready"
                    );
                    assets.push(AssetReport {
                        url: url.clone(),
                        bytes,
                        source: response.source(),
                        elapsed,
                    });
                }
                Ok(response) => failures.push(format!("{url}: HTTP {}", response.status())),
                Err(e) => failures.push(format!("{url}: {e}")),
            }
        }

        cache.flush().await;
        let purged = if stale_on_error {
            cache.initialize().await.purged
        } else {
            purged_early
        };

        if !failures.is_empty() {
            let reason = failures.join("; ");
            warn!(failed = failures.len(), reason = %reason, "preload failed");
            guard.finished = true;
            self.status.send_replace(PreloadStatus::Failed(reason.clone()));
            return Err(preload_failed(&self.urls, reason));
        }

        if let Some(state) = &self.warm_state {
            let stats = cache.stats().await;
            state
                .mark_cache_ready(Some(WarmCacheStats::from_cache(&cache.counters(), &stats)))
                .await;
        }

        let report = PreloadReport {
            assets,
            purged,
            elapsed: started.elapsed(),
        };
        info!(
            assets = report.assets.len(),
            from_cache = report.served_from_cache(),
            size = %format_bytes(report.total_bytes()),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "preload complete"
        );

        guard.finished = true;
        self.status.send_replace(PreloadStatus::Ready(report.clone()));
        Ok(report)
    }
}

impl std::fmt::Debug for AssetPreloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetPreloader")
            .field("urls", &self.urls)
            .field("status", &*self.status.borrow())
            .finish()
    }
}

fn preload_failed(urls: &[String], reason: String) -> CacheError {
    let endpoint = urls.join(", ");
    CacheError::Network {
        endpoint: endpoint.clone(),
        operation: "preload assets",
        source: reason.into(),
        recovery_hint: RecoveryHint::CheckNetwork { endpoint },
    }
}
