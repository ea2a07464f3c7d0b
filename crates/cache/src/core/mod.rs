//! The resource cache
//!
//! [`ResourceCache`] is a durable, expiring cache of network-fetched assets
//! placed in front of a [`Fetcher`](crate::fetch::Fetcher):
//! - Entries are keyed by their fetch URL and expire after a retention window
//! - Expiry is checked on read and by an explicit sweep, never by a timer
//! - Every store failure degrades to a miss; only a real fetch on a genuine
//!   miss can return an error

pub mod internal;

mod builder;
mod operations;
mod types;

pub use builder::ResourceCacheBuilder;
pub use operations::{HousekeepingReport, ResourceStats};
pub use types::ResourceCache;

#[cfg(test)]
mod tests;
