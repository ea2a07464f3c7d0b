//! Store used when persistence is disabled or could not be opened

use super::ResourceStore;
use crate::entry::{CacheEntry, EntryMetadata};
use crate::errors::{CacheError, RecoveryHint, Result, StoreType};
use async_trait::async_trait;

/// Fails every call with [`CacheError::StoreUnavailable`], which the cache
/// treats as an empty store
#[derive(Debug, Clone)]
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    fn error(&self) -> CacheError {
        CacheError::StoreUnavailable {
            store_type: StoreType::Unavailable,
            reason: self.reason.clone(),
            recovery_hint: RecoveryHint::UseFallback,
        }
    }
}

#[async_trait]
impl ResourceStore for UnavailableStore {
    async fn read(&self, _key: &str) -> Result<Option<CacheEntry>> {
        Err(self.error())
    }

    async fn read_metadata(&self, _key: &str) -> Result<Option<EntryMetadata>> {
        Err(self.error())
    }

    async fn write(&self, _entry: CacheEntry) -> Result<()> {
        Err(self.error())
    }

    async fn remove(&self, _key: &str) -> Result<bool> {
        Err(self.error())
    }

    async fn remove_if_stored_before(&self, _key: &str, _cutoff: u64) -> Result<bool> {
        Err(self.error())
    }

    async fn stored_before(&self, _cutoff: u64) -> Result<Vec<String>> {
        Err(self.error())
    }

    async fn list_metadata(&self) -> Result<Vec<EntryMetadata>> {
        Err(self.error())
    }

    async fn clear(&self) -> Result<()> {
        Err(self.error())
    }

    fn store_type(&self) -> StoreType {
        StoreType::Unavailable
    }
}
