//! Error conversion utilities

use super::types::{CacheError, RecoveryHint, SerializationOp};
use std::path::PathBuf;
use std::time::Duration;

impl From<std::io::Error> for CacheError {
    fn from(error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        let recovery_hint = match error.kind() {
            ErrorKind::PermissionDenied => RecoveryHint::CheckPermissions {
                path: PathBuf::from("."),
            },
            ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => {
                RecoveryHint::Retry {
                    after: Duration::from_millis(100),
                }
            }
            _ => RecoveryHint::CheckDiskSpace,
        };

        Self::Io {
            path: PathBuf::from("."),
            operation: "unknown",
            source: error,
            recovery_hint,
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization {
            key: String::new(),
            operation: SerializationOp::Decode,
            source: Box::new(error),
            recovery_hint: RecoveryHint::ClearAndRetry,
        }
    }
}

impl From<reqwest::Error> for CacheError {
    fn from(error: reqwest::Error) -> Self {
        let endpoint = error
            .url()
            .map(|u| u.to_string())
            .unwrap_or_default();
        Self::Network {
            recovery_hint: RecoveryHint::CheckNetwork {
                endpoint: endpoint.clone(),
            },
            endpoint,
            operation: "fetch",
            source: Box::new(error),
        }
    }
}

/// Convert cache errors to core errors
impl From<CacheError> for assetcache_core::Error {
    fn from(error: CacheError) -> Self {
        match &error {
            CacheError::Network { endpoint, .. } => {
                assetcache_core::Error::network(endpoint.clone(), error.to_string())
            }
            CacheError::Timeout {
                operation,
                duration,
                ..
            } => assetcache_core::Error::timeout(*operation, *duration),
            CacheError::Configuration { message, .. } => {
                assetcache_core::Error::configuration(message.clone())
            }
            _ => assetcache_core::Error::cache(error.to_string()),
        }
    }
}
