//! Persistent stores behind the resource cache
//!
//! A store is a keyed table of [`CacheEntry`] records. Every operation is an
//! async "transaction" that either commits or returns an error; the cache on
//! top decides how to degrade. Stores never look at the retention window
//! themselves, they only answer questions about `stored_at`.

mod disk;
mod memory;
mod paths;
mod unavailable;

pub use disk::DiskStore;
pub use memory::MemoryStore;
pub use unavailable::UnavailableStore;

use crate::entry::{CacheEntry, EntryMetadata};
use crate::errors::{Result, StoreType};
use async_trait::async_trait;
use std::fmt::Debug;

/// Keyed storage for cache entries
#[async_trait]
pub trait ResourceStore: Send + Sync + Debug {
    /// Read the entry for `key`, if any
    async fn read(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// Read only the metadata for `key`
    async fn read_metadata(&self, key: &str) -> Result<Option<EntryMetadata>>;

    /// Insert or overwrite the entry under its key
    async fn write(&self, entry: CacheEntry) -> Result<()>;

    /// Remove `key`; returns whether something was removed
    async fn remove(&self, key: &str) -> Result<bool>;

    /// Remove `key` only if its current `stored_at` is at or before `cutoff`.
    /// An entry rewritten after the caller looked at it survives.
    async fn remove_if_stored_before(&self, key: &str, cutoff: u64) -> Result<bool>;

    /// Keys whose `stored_at` is at or before `cutoff`
    async fn stored_before(&self, cutoff: u64) -> Result<Vec<String>>;

    /// Metadata of every entry
    async fn list_metadata(&self) -> Result<Vec<EntryMetadata>>;

    /// Remove every entry
    async fn clear(&self) -> Result<()>;

    fn store_type(&self) -> StoreType;
}
