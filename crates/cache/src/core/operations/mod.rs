//! Cache operations, implemented directly on [`ResourceCache`](super::ResourceCache)

mod clear;
mod get;
mod housekeeping;
mod intercept;
mod purge;
mod put;
mod remove;
mod stats;

pub use housekeeping::HousekeepingReport;
pub use stats::ResourceStats;

use crate::errors::{CacheError, RecoveryHint, Result};

pub(super) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey {
            key: String::new(),
            reason: "key must not be empty".to_string(),
            recovery_hint: RecoveryHint::Ignore,
        });
    }
    Ok(())
}
