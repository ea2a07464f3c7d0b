//! Cache-first fetch

use crate::entry::Payload;
use crate::errors::Result;
use crate::events::CacheEvent;
use crate::fetch::{FetchOptions, FetchResponse, FetchStrategy};
use crate::kind::ResourceKind;

use super::super::types::ResourceCache;
use super::get::ExpiredEntries;

impl ResourceCache {
    /// Fetch `url`, serving it from the cache when a live entry exists
    ///
    /// On a miss the real fetch runs; a successful response is returned as
    /// received while a copy of its body is stored in the background.
    /// Non-success responses are returned and not cached. Only a failure of
    /// the real fetch is an error, unless `options.strategy` allows an
    /// expired entry to stand in.
    pub async fn intercept_fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchResponse> {
        let stale_on_error = options.strategy == FetchStrategy::CacheFirstStaleOnError;
        let expired = if stale_on_error {
            ExpiredEntries::Keep
        } else {
            ExpiredEntries::Drop
        };

        if let Some(payload) = self.lookup(url, expired).await {
            match FetchResponse::from_cache(url, &payload) {
                Ok(response) => {
                    self.emit(CacheEvent::Hit {
                        url: url.to_string(),
                        bytes: response.bytes().len() as u64,
                    });
                    return Ok(response);
                }
                Err(e) => self.report_failure("serve cached response", url, &e),
            }
        }

        self.emit(CacheEvent::DownloadStarted {
            url: url.to_string(),
        });
        let response = match self.inner.fetcher.fetch(url, options).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "fetch failed");
                self.emit(CacheEvent::DownloadFailed {
                    url: url.to_string(),
                    error: e.to_string(),
                });
                if stale_on_error {
                    if let Some(stale) = self.serve_stale(url).await {
                        return Ok(stale);
                    }
                }
                return Err(e);
            }
        };

        if response.is_success() {
            self.store_in_background(url, response.bytes());
            return Ok(response);
        }

        tracing::debug!(url = %url, status = %response.status(), "not caching unsuccessful response");
        if stale_on_error {
            self.emit(CacheEvent::DownloadFailed {
                url: url.to_string(),
                error: format!("HTTP {}", response.status()),
            });
            if let Some(stale) = self.serve_stale(url).await {
                return Ok(stale);
            }
        }
        Ok(response)
    }

    /// Wait for every background store started by `intercept_fetch`
    pub async fn flush(&self) {
        loop {
            let handles = std::mem::take(&mut *self.inner.pending.lock());
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    tracing::warn!(error = %e, "background cache write did not complete");
                }
            }
        }
    }

    /// Any entry still stored under `url`, regardless of age
    async fn serve_stale(&self, url: &str) -> Option<FetchResponse> {
        let entry = match self.inner.store.read(url).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                self.report_failure("serve stale entry", url, &e);
                return None;
            }
        };

        match FetchResponse::from_stale_cache(url, &entry.payload) {
            Ok(response) => {
                tracing::info!(
                    url = %url,
                    age_ms = entry.metadata.age_millis(self.now()),
                    "network unavailable, serving stale entry"
                );
                self.emit(CacheEvent::StaleServed {
                    url: url.to_string(),
                    bytes: entry.metadata.byte_size,
                });
                Some(response)
            }
            Err(e) => {
                self.report_failure("serve stale entry", url, &e);
                None
            }
        }
    }

    fn store_in_background(&self, url: &str, body: bytes::Bytes) {
        let cache = self.clone();
        let url = url.to_string();
        let handle = tokio::spawn(async move {
            let kind = ResourceKind::classify(&url);
            let bytes = body.len() as u64;
            if cache.put(&url, Payload::Binary(body), kind).await {
                cache.emit(CacheEvent::Stored { url, bytes });
            } else {
                tracing::debug!(url = %url, "response not cached");
            }
        });

        let mut pending = self.inner.pending.lock();
        pending.retain(|handle| !handle.is_finished());
        pending.push(handle);
    }
}
