//! The outbound fetch path the cache is interposed in front of

mod http;
mod response;

pub use http::HttpFetcher;
pub use response::{FetchResponse, ResponseSource};

use crate::errors::Result;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Method;
use std::fmt::Debug;
use std::time::Duration;

/// How `intercept_fetch` uses the cache around the real fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStrategy {
    /// Live entries are served; anything else goes to the network and a
    /// network failure is returned as an error
    #[default]
    CacheFirst,
    /// As `CacheFirst`, but when the network fails or answers with an error
    /// status an expired entry that has not been purged yet is served
    CacheFirstStaleOnError,
}

/// Per-request options forwarded to the real fetch
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub method: Method,
    pub headers: HeaderMap,
    /// Overrides the fetcher's default timeout
    pub timeout: Option<Duration>,
    /// Read by the cache only, never by the fetcher
    pub strategy: FetchStrategy,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            timeout: None,
            strategy: FetchStrategy::default(),
        }
    }
}

impl FetchOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_strategy(mut self, strategy: FetchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_header(
        mut self,
        name: reqwest::header::HeaderName,
        value: reqwest::header::HeaderValue,
    ) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Performs real network fetches; a failure means the resource could not be
/// obtained at all, not that the server answered with an error status
#[async_trait]
pub trait Fetcher: Send + Sync + Debug {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchResponse>;
}
