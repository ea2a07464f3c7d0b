//! Response objects handed back by `intercept_fetch`

use crate::entry::Payload;
use crate::errors::{CacheError, RecoveryHint, Result, SerializationOp};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

/// Where a response body came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
    /// An expired entry served because the network could not be used
    StaleCache,
}

impl ResponseSource {
    pub const fn is_cache(self) -> bool {
        matches!(self, Self::Cache | Self::StaleCache)
    }
}

/// A fully buffered response
#[derive(Debug, Clone)]
pub struct FetchResponse {
    url: String,
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    source: ResponseSource,
}

impl FetchResponse {
    /// A response as received from the network
    pub fn from_network(
        url: impl Into<String>,
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        Self {
            url: url.into(),
            status,
            headers,
            body,
            source: ResponseSource::Network,
        }
    }

    /// Synthesize a `200 OK` response around a cached payload
    pub fn from_cache(url: impl Into<String>, payload: &Payload) -> Result<Self> {
        Self::synthesize(url, payload, ResponseSource::Cache)
    }

    /// Same as [`from_cache`](Self::from_cache) for an expired entry
    pub fn from_stale_cache(url: impl Into<String>, payload: &Payload) -> Result<Self> {
        Self::synthesize(url, payload, ResponseSource::StaleCache)
    }

    fn synthesize(url: impl Into<String>, payload: &Payload, source: ResponseSource) -> Result<Self> {
        let body = payload.to_bytes()?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(payload.content_type()));
        headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len() as u64));

        Ok(Self {
            url: url.into(),
            status: StatusCode::OK,
            headers,
            body,
            source,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn source(&self) -> ResponseSource {
        self.source
    }

    pub fn is_from_cache(&self) -> bool {
        self.source.is_cache()
    }

    pub fn is_stale(&self) -> bool {
        self.source == ResponseSource::StaleCache
    }

    /// Body bytes; cheap to clone
    pub fn bytes(&self) -> Bytes {
        self.body.clone()
    }

    pub fn into_bytes(self) -> Bytes {
        self.body
    }

    pub fn text(&self) -> Result<String> {
        match String::from_utf8(self.body.to_vec()) {
            Ok(text) => Ok(text),
            Err(e) => Err(CacheError::Serialization {
                key: self.url.clone(),
                operation: SerializationOp::Decode,
                source: Box::new(e),
                recovery_hint: RecoveryHint::Ignore,
            }),
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        match serde_json::from_slice(&self.body) {
            Ok(value) => Ok(value),
            Err(e) => Err(CacheError::Serialization {
                key: self.url.clone(),
                operation: SerializationOp::Decode,
                source: Box::new(e),
                recovery_hint: RecoveryHint::Ignore,
            }),
        }
    }
}
