//! `reqwest`-backed fetcher

use super::{FetchOptions, FetchResponse, Fetcher};
use crate::errors::{CacheError, RecoveryHint, Result};
use assetcache_core::{DEFAULT_FETCH_TIMEOUT, DEFAULT_USER_AGENT};
use async_trait::async_trait;
use std::time::Duration;

/// Fetches over HTTP(S) and buffers the whole body
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_settings(DEFAULT_FETCH_TIMEOUT, DEFAULT_USER_AGENT)
    }

    pub fn with_settings(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = match reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                return Err(CacheError::Configuration {
                    message: format!("Failed to create HTTP client: {e}"),
                    recovery_hint: RecoveryHint::UpdateConfiguration,
                });
            }
        };

        Ok(Self { client, timeout })
    }

    fn map_error(&self, url: &str, timeout: Duration, error: reqwest::Error) -> CacheError {
        if error.is_timeout() {
            return CacheError::Timeout {
                operation: "fetch",
                duration: timeout,
                recovery_hint: RecoveryHint::Retry {
                    after: Duration::from_secs(1),
                },
            };
        }
        CacheError::Network {
            endpoint: url.to_string(),
            operation: "fetch",
            source: Box::new(error),
            recovery_hint: RecoveryHint::CheckNetwork {
                endpoint: url.to_string(),
            },
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchResponse> {
        let parsed = match url::Url::parse(url) {
            Ok(u) => u,
            Err(e) => {
                return Err(CacheError::Network {
                    endpoint: url.to_string(),
                    operation: "parse url",
                    source: Box::new(e),
                    recovery_hint: RecoveryHint::Manual {
                        instructions: "Use an absolute http(s) URL".to_string(),
                    },
                });
            }
        };

        let timeout = options.timeout.unwrap_or(self.timeout);
        let request = self
            .client
            .request(options.method.clone(), parsed)
            .headers(options.headers.clone())
            .timeout(timeout);

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => return Err(self.map_error(url, timeout, e)),
        };

        let status = response.status();
        let headers = response.headers().clone();
        let body = match response.bytes().await {
            Ok(b) => b,
            Err(e) => return Err(self.map_error(url, timeout, e)),
        };

        tracing::trace!(url = %url, status = %status, bytes = body.len(), "Fetched");
        Ok(FetchResponse::from_network(url, status, headers, body))
    }
}
