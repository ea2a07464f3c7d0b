//! Cache clear operation

use super::super::types::ResourceCache;

impl ResourceCache {
    /// Remove every entry
    pub async fn clear(&self) -> bool {
        match self.inner.store.clear().await {
            Ok(()) => {
                tracing::info!("cache cleared");
                true
            }
            Err(e) => {
                self.report_failure("clear", "*", &e);
                false
            }
        }
    }
}
