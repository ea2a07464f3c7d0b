//! Expiry sweep

use super::super::types::ResourceCache;

impl ResourceCache {
    /// Delete every entry that has outlived the retention window
    ///
    /// Works entry by entry without a global lock: an entry rewritten between
    /// the scan and its removal is kept. Returns how many entries were
    /// removed.
    pub async fn purge_expired(&self) -> usize {
        let now = self.now();
        // Nothing can be older than the clock itself
        let cutoff = match now.checked_sub(self.inner.retention_millis) {
            Some(cutoff) => cutoff,
            None => return 0,
        };

        let candidates = match self.inner.store.stored_before(cutoff).await {
            Ok(keys) => keys,
            Err(e) => {
                self.report_failure("purge_expired", "*", &e);
                return 0;
            }
        };

        let mut purged = 0;
        for key in &candidates {
            match self.inner.store.remove_if_stored_before(key, cutoff).await {
                Ok(true) => purged += 1,
                Ok(false) => {}
                Err(e) => self.report_failure("purge_expired", key, &e),
            }
        }

        if purged > 0 {
            self.inner.stats.record_expired(purged as u64);
            tracing::info!(purged, "purged expired cache entries");
        }
        purged
    }
}
