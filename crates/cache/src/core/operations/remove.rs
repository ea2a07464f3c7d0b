//! Cache delete operation

use super::super::types::ResourceCache;

impl ResourceCache {
    /// Delete `key`; deleting a key that is not cached succeeds
    pub async fn delete(&self, key: &str) -> bool {
        match self.inner.store.remove(key).await {
            Ok(removed) => {
                if removed {
                    self.inner.stats.record_removal();
                    tracing::debug!(url = %key, "deleted resource");
                }
                true
            }
            Err(e) => {
                self.report_failure("delete", key, &e);
                false
            }
        }
    }
}
