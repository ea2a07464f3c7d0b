//! Cache get operation

use crate::entry::{EntryMetadata, Payload};
use crate::errors::CacheError;

use super::super::types::ResourceCache;

/// What a lookup does with an entry past the retention window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ExpiredEntries {
    Drop,
    /// Left in place for a stale fallback
    Keep,
}

impl ResourceCache {
    /// Return the payload stored under `key` if it has not expired
    ///
    /// An expired entry is deleted on the way out. Damaged entries are
    /// deleted too. Any store failure reads as a miss.
    pub async fn get(&self, key: &str) -> Option<Payload> {
        self.lookup(key, ExpiredEntries::Drop).await
    }

    pub(super) async fn lookup(&self, key: &str, expired: ExpiredEntries) -> Option<Payload> {
        // Metadata first: an expired payload is never read or hashed
        let metadata = match self.inner.store.read_metadata(key).await {
            Ok(Some(metadata)) => metadata,
            Ok(None) => {
                self.inner.stats.record_miss();
                tracing::debug!(url = %key, "cache miss");
                return None;
            }
            Err(e) => {
                self.drop_damaged(key, e).await;
                return None;
            }
        };

        let now = self.now();
        if metadata.is_expired(now, self.inner.retention_millis) {
            self.inner.stats.record_miss();
            if expired == ExpiredEntries::Drop {
                self.drop_expired(key, &metadata, now).await;
            }
            return None;
        }

        match self.inner.store.read(key).await {
            Ok(Some(entry)) => {
                self.inner.stats.record_hit();
                tracing::debug!(url = %key, bytes = entry.metadata.byte_size, "cache hit");
                Some(entry.payload)
            }
            // Removed since the metadata was read
            Ok(None) => {
                self.inner.stats.record_miss();
                None
            }
            Err(e) => {
                self.drop_damaged(key, e).await;
                None
            }
        }
    }

    async fn drop_expired(&self, key: &str, metadata: &EntryMetadata, now: u64) {
        // Conditional so a concurrent refresh of the same key survives
        match self
            .inner
            .store
            .remove_if_stored_before(key, metadata.stored_at)
            .await
        {
            Ok(true) => {
                self.inner.stats.record_expired(1);
                tracing::debug!(
                    url = %key,
                    age_ms = metadata.age_millis(now),
                    "dropped expired entry"
                );
            }
            Ok(false) => {}
            Err(e) => self.report_failure("drop expired entry", key, &e),
        }
    }

    async fn drop_damaged(&self, key: &str, error: CacheError) {
        self.report_failure("get", key, &error);
        self.inner.stats.record_miss();
        if error.is_corruption() {
            match self.inner.store.remove(key).await {
                Ok(_) => tracing::debug!(url = %key, "dropped damaged entry"),
                Err(e) => self.report_failure("drop damaged entry", key, &e),
            }
        }
    }
}
