//! Error handling for the resource cache
//!
//! Every variant carries a [`RecoveryHint`]. Most of these errors never reach
//! callers of [`crate::ResourceCache`]: the cache logs them and degrades to a
//! miss. Only [`CacheError::Network`] and [`CacheError::Timeout`] from a real
//! fetch on a genuine miss are surfaced.

mod conversions;
mod display;
mod recovery;
mod types;

pub use types::*;
