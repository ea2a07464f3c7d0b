//! Cache statistics operations

use crate::entry::EntryMetadata;
use crate::kind::ResourceKind;
use assetcache_utils::format_bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::super::internal::CacheCounters;
use super::super::types::ResourceCache;

/// Aggregate over the stored entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStats {
    pub count: u64,
    pub total_bytes: u64,
    /// Entry count per kind; kinds with no entries are absent
    pub by_kind: BTreeMap<ResourceKind, u64>,
}

impl ResourceStats {
    pub fn from_metadata<'a>(entries: impl IntoIterator<Item = &'a EntryMetadata>) -> Self {
        let mut stats = Self::default();
        for entry in entries {
            stats.count += 1;
            stats.total_bytes += entry.byte_size;
            *stats.by_kind.entry(entry.kind).or_insert(0) += 1;
        }
        stats
    }

    pub fn formatted_size(&self) -> String {
        format_bytes(self.total_bytes)
    }
}

impl ResourceCache {
    /// Count and size of what is stored, expired entries included
    ///
    /// A store failure reports an empty cache.
    pub async fn stats(&self) -> ResourceStats {
        match self.inner.store.list_metadata().await {
            Ok(entries) => ResourceStats::from_metadata(&entries),
            Err(e) => {
                self.report_failure("stats", "*", &e);
                ResourceStats::default()
            }
        }
    }

    /// Metadata of every stored entry, sorted by key
    pub async fn entries(&self) -> Vec<EntryMetadata> {
        match self.inner.store.list_metadata().await {
            Ok(mut entries) => {
                entries.sort_by(|a, b| a.key.cmp(&b.key));
                entries
            }
            Err(e) => {
                self.report_failure("entries", "*", &e);
                Vec::new()
            }
        }
    }

    /// In-process operation counters since this cache was built
    pub fn counters(&self) -> CacheCounters {
        self.inner.stats.snapshot()
    }
}
