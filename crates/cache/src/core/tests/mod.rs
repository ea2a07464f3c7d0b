//! ResourceCache tests

mod basic;
mod failsoft;
mod intercept;

use crate::errors::{CacheError, RecoveryHint, Result};
use crate::fetch::{FetchOptions, FetchResponse, Fetcher};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Serves a fixed response and counts how often it was asked
#[derive(Debug, Clone)]
pub(super) struct StubFetcher {
    calls: Arc<AtomicUsize>,
    status: StatusCode,
    body: Bytes,
    fail: bool,
}

impl StubFetcher {
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::with_status(StatusCode::OK, body)
    }

    pub fn with_status(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            status,
            body: body.into(),
            fail: false,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            fail: true,
            ..Self::ok(Bytes::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &str, _options: &FetchOptions) -> Result<FetchResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CacheError::Network {
                endpoint: url.to_string(),
                operation: "fetch",
                source: "connection refused".into(),
                recovery_hint: RecoveryHint::CheckNetwork {
                    endpoint: url.to_string(),
                },
            });
        }
        Ok(FetchResponse::from_network(
            url,
            self.status,
            HeaderMap::new(),
            self.body.clone(),
        ))
    }
}
