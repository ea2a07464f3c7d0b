//! Cache put operation

use crate::entry::{CacheEntry, Payload};
use crate::kind::ResourceKind;

use super::super::types::ResourceCache;
use super::validate_key;

impl ResourceCache {
    /// Store `payload` under `key`, overwriting any previous entry
    ///
    /// Returns `false` when nothing was stored; the previous entry, if any,
    /// is then left as it was.
    pub async fn put(&self, key: &str, payload: impl Into<Payload>, kind: ResourceKind) -> bool {
        match validate_key(key) {
            Ok(()) => {}
            Err(e) => {
                self.report_failure("put", key, &e);
                return false;
            }
        }

        let entry = match CacheEntry::new(key, payload.into(), kind, self.now()) {
            Ok(entry) => entry,
            Err(e) => {
                self.report_failure("put", key, &e);
                return false;
            }
        };
        let bytes = entry.metadata.byte_size;

        match self.inner.store.write(entry).await {
            Ok(()) => {
                self.inner.stats.record_write();
                tracing::debug!(url = %key, bytes, kind = %kind, "stored resource");
                true
            }
            Err(e) => {
                self.report_failure("put", key, &e);
                false
            }
        }
    }
}
