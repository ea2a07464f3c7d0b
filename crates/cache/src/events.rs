//! Notifications about what the cache-first fetch path is doing

use serde::Serialize;

/// Buffered events per subscriber before the slowest one starts lagging
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Published by `ResourceCache::intercept_fetch` to every subscriber
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CacheEvent {
    /// Served from a live entry
    Hit { url: String, bytes: u64 },
    /// Nothing usable cached, going to the network
    DownloadStarted { url: String },
    /// A fetched body was written to the store
    Stored { url: String, bytes: u64 },
    /// The network fetch failed
    DownloadFailed { url: String, error: String },
    /// An expired entry was served because the network fetch failed
    StaleServed { url: String, bytes: u64 },
}

impl CacheEvent {
    pub fn url(&self) -> &str {
        match self {
            Self::Hit { url, .. }
            | Self::DownloadStarted { url }
            | Self::Stored { url, .. }
            | Self::DownloadFailed { url, .. }
            | Self::StaleServed { url, .. } => url,
        }
    }
}
