//! Persisted warm-cache state
//!
//! A small JSON document recording whether the assets have been fetched and
//! the model loaded recently enough that startup work can be skipped. It is
//! shared between processes through the file; [`WarmState::sync`] picks up
//! writes made by others and [`WarmState::subscribe`] notifies in-process
//! listeners of every change.

use crate::clock::Clock;
use crate::core::internal::CacheCounters;
use crate::core::ResourceStats;
use assetcache_utils::write_atomic_async;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Cache statistics as last recorded in the state file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarmCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub total_size: u64,
}

impl WarmCacheStats {
    pub fn from_cache(counters: &CacheCounters, stats: &ResourceStats) -> Self {
        Self {
            hits: counters.hits,
            misses: counters.misses,
            total_size: stats.total_bytes,
        }
    }
}

/// Contents of the state file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarmSnapshot {
    pub is_initialized: bool,
    pub is_model_loaded: bool,
    pub resources_ready: bool,
    /// Milliseconds since the Unix epoch
    pub last_model_init: Option<u64>,
    pub last_cache_check: Option<u64>,
    pub cache_stats: WarmCacheStats,
    pub last_saved: Option<u64>,
}

struct Tracked {
    snapshot: WarmSnapshot,
    /// mtime of the file as of our last read or write
    seen_modified: Option<SystemTime>,
}

/// Handle on the state file
pub struct WarmState {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    ready_window_millis: u64,
    tracked: Mutex<Tracked>,
    changes: watch::Sender<WarmSnapshot>,
}

impl WarmState {
    /// Load the state at `path`; a missing or unreadable file yields defaults
    pub async fn load(path: impl Into<PathBuf>, clock: Arc<dyn Clock>, ready_window: Duration) -> Self {
        let path = path.into();
        let (snapshot, seen_modified) = read_snapshot(&path).await;
        let (changes, _) = watch::channel(snapshot.clone());

        Self {
            path,
            clock,
            ready_window_millis: ready_window.as_millis() as u64,
            tracked: Mutex::new(Tracked {
                snapshot,
                seen_modified,
            }),
            changes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> WarmSnapshot {
        self.tracked.lock().snapshot.clone()
    }

    /// All readiness flags are set and the model was loaded within the
    /// ready window
    pub fn is_cache_ready(&self) -> bool {
        let now = self.clock.now_millis();
        let tracked = self.tracked.lock();
        let state = &tracked.snapshot;

        let is_recent = match state.last_model_init {
            Some(at) => now.saturating_sub(at) < self.ready_window_millis,
            None => false,
        };

        state.is_initialized && state.is_model_loaded && state.resources_ready && is_recent
    }

    /// Whole minutes since the model was last loaded
    pub fn cache_age(&self) -> Option<u64> {
        let now = self.clock.now_millis();
        self.tracked
            .lock()
            .snapshot
            .last_model_init
            .map(|at| now.saturating_sub(at) / 60_000)
    }

    /// Record a completed preload
    pub async fn mark_cache_ready(&self, stats: Option<WarmCacheStats>) {
        let now = self.clock.now_millis();
        self.update(|state| {
            state.is_initialized = true;
            state.is_model_loaded = true;
            state.resources_ready = true;
            state.last_model_init = Some(now);
            state.last_cache_check = Some(now);
            if let Some(stats) = stats {
                state.cache_stats = stats;
            }
        })
        .await;
        debug!(path = %self.path.display(), "cache marked ready");
    }

    pub async fn mark_model_loaded(&self) {
        let now = self.clock.now_millis();
        self.update(|state| {
            state.is_model_loaded = true;
            state.last_model_init = Some(now);
        })
        .await;
    }

    pub async fn update_cache_stats(&self, stats: WarmCacheStats) {
        self.update(|state| state.cache_stats = stats).await;
    }

    /// Delete the state file and go back to defaults
    pub async fn reset(&self) {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to remove state file");
            }
        }

        let snapshot = WarmSnapshot::default();
        {
            let mut tracked = self.tracked.lock();
            tracked.snapshot = snapshot.clone();
            tracked.seen_modified = None;
        }
        self.changes.send_replace(snapshot);
    }

    /// Reload if another process changed the file since we last saw it
    ///
    /// Returns whether the in-memory state was replaced.
    pub async fn sync(&self) -> bool {
        let modified = file_modified(&self.path).await;
        let seen = self.tracked.lock().seen_modified;
        if modified == seen {
            return false;
        }

        let (snapshot, seen_modified) = read_snapshot(&self.path).await;
        debug!(path = %self.path.display(), "state file changed, reloading");
        {
            let mut tracked = self.tracked.lock();
            tracked.snapshot = snapshot.clone();
            tracked.seen_modified = seen_modified;
        }
        self.changes.send_replace(snapshot);
        true
    }

    /// Receive every snapshot this handle saves or reloads
    pub fn subscribe(&self) -> watch::Receiver<WarmSnapshot> {
        self.changes.subscribe()
    }

    async fn update(&self, change: impl FnOnce(&mut WarmSnapshot)) {
        let now = self.clock.now_millis();
        let snapshot = {
            let mut tracked = self.tracked.lock();
            change(&mut tracked.snapshot);
            tracked.snapshot.last_saved = Some(now);
            tracked.snapshot.clone()
        };

        self.save(&snapshot).await;
        self.changes.send_replace(snapshot);
    }

    /// Failures are logged; the in-memory state stays authoritative
    async fn save(&self, snapshot: &WarmSnapshot) {
        let json = match serde_json::to_vec_pretty(snapshot) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to encode warm state");
                return;
            }
        };

        match write_atomic_async(&self.path, &json).await {
            Ok(()) => {
                let modified = file_modified(&self.path).await;
                self.tracked.lock().seen_modified = modified;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to save warm state");
            }
        }
    }
}

impl std::fmt::Debug for WarmState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarmState")
            .field("path", &self.path)
            .field("ready_window_millis", &self.ready_window_millis)
            .field("snapshot", &self.tracked.lock().snapshot)
            .finish()
    }
}

async fn file_modified(path: &Path) -> Option<SystemTime> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata.modified().ok(),
        Err(_) => None,
    }
}

async fn read_snapshot(path: &Path) -> (WarmSnapshot, Option<SystemTime>) {
    let modified = file_modified(path).await;
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return (WarmSnapshot::default(), None),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read warm state, using defaults");
            return (WarmSnapshot::default(), modified);
        }
    };

    match serde_json::from_slice(&raw) {
        Ok(snapshot) => (snapshot, modified),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt warm state, using defaults");
            (WarmSnapshot::default(), modified)
        }
    }
}
