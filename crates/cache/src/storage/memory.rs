//! In-process store backed by a concurrent map

use super::ResourceStore;
use crate::entry::{CacheEntry, EntryMetadata};
use crate::errors::{Result, StoreType};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::BTreeSet;

/// Entries held in memory, with a secondary index ordered by `stored_at`
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, CacheEntry>,
    by_stored_at: Mutex<BTreeSet<(u64, String)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn read_metadata(&self, key: &str) -> Result<Option<EntryMetadata>> {
        Ok(self
            .entries
            .get(key)
            .map(|entry| entry.value().metadata.clone()))
    }

    async fn write(&self, entry: CacheEntry) -> Result<()> {
        let key = entry.key().to_string();
        let stored_at = entry.metadata.stored_at;

        // Index updates happen under the index lock so the index never
        // points at a stale timestamp for a live key
        let mut index = self.by_stored_at.lock();
        if let Some(previous) = self.entries.insert(key.clone(), entry) {
            index.remove(&(previous.metadata.stored_at, key.clone()));
        }
        index.insert((stored_at, key));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let mut index = self.by_stored_at.lock();
        match self.entries.remove(key) {
            Some((key, previous)) => {
                index.remove(&(previous.metadata.stored_at, key));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_if_stored_before(&self, key: &str, cutoff: u64) -> Result<bool> {
        let mut index = self.by_stored_at.lock();
        match self
            .entries
            .remove_if(key, |_, entry| entry.metadata.stored_at <= cutoff)
        {
            Some((key, previous)) => {
                index.remove(&(previous.metadata.stored_at, key));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn stored_before(&self, cutoff: u64) -> Result<Vec<String>> {
        let index = self.by_stored_at.lock();
        Ok(index
            .iter()
            .take_while(|(stored_at, _)| *stored_at <= cutoff)
            .map(|(_, key)| key.clone())
            .collect())
    }

    async fn list_metadata(&self) -> Result<Vec<EntryMetadata>> {
        Ok(self
            .entries
            .iter()
            .map(|entry| entry.value().metadata.clone())
            .collect())
    }

    async fn clear(&self) -> Result<()> {
        let mut index = self.by_stored_at.lock();
        self.entries.clear();
        index.clear();
        Ok(())
    }

    fn store_type(&self) -> StoreType {
        StoreType::Memory
    }
}
