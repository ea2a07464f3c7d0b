//! Startup housekeeping

use serde::{Deserialize, Serialize};

use super::super::types::ResourceCache;
use super::stats::ResourceStats;

/// Outcome of [`ResourceCache::initialize`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HousekeepingReport {
    pub purged: usize,
    pub stats: ResourceStats,
}

impl ResourceCache {
    /// Purge expired entries, then report what is left
    pub async fn initialize(&self) -> HousekeepingReport {
        let purged = self.purge_expired().await;
        let stats = self.stats().await;
        tracing::info!(
            purged,
            entries = stats.count,
            size = %stats.formatted_size(),
            "cache initialized"
        );
        HousekeepingReport { purged, stats }
    }
}
