//! Cache entries and their payloads

use crate::errors::{CacheError, RecoveryHint, Result, SerializationOp};
use crate::kind::ResourceKind;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Content stored for a URL
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Raw response body (model weights, WASM, ...)
    Binary(Bytes),
    /// Text resource
    Text(String),
    /// Structured JSON value
    Json(serde_json::Value),
}

/// How a payload is laid out on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadEncoding {
    Binary,
    Text,
    Json,
}

impl Payload {
    pub fn encoding(&self) -> PayloadEncoding {
        match self {
            Payload::Binary(_) => PayloadEncoding::Binary,
            Payload::Text(_) => PayloadEncoding::Text,
            Payload::Json(_) => PayloadEncoding::Json,
        }
    }

    /// Serialized form of the payload, as written to a store or a response body
    pub fn to_bytes(&self) -> Result<Bytes> {
        match self {
            Payload::Binary(bytes) => Ok(bytes.clone()),
            Payload::Text(text) => Ok(Bytes::copy_from_slice(text.as_bytes())),
            Payload::Json(value) => match serde_json::to_vec(value) {
                Ok(encoded) => Ok(Bytes::from(encoded)),
                Err(e) => Err(CacheError::Serialization {
                    key: String::new(),
                    operation: SerializationOp::Encode,
                    source: Box::new(e),
                    recovery_hint: RecoveryHint::Ignore,
                }),
            },
        }
    }

    /// Rebuild a payload from its serialized bytes
    pub fn from_bytes(key: &str, encoding: PayloadEncoding, bytes: Bytes) -> Result<Self> {
        match encoding {
            PayloadEncoding::Binary => Ok(Payload::Binary(bytes)),
            PayloadEncoding::Text => match String::from_utf8(bytes.to_vec()) {
                Ok(text) => Ok(Payload::Text(text)),
                Err(e) => Err(CacheError::Serialization {
                    key: key.to_string(),
                    operation: SerializationOp::Decode,
                    source: Box::new(e),
                    recovery_hint: RecoveryHint::ClearAndRetry,
                }),
            },
            PayloadEncoding::Json => match serde_json::from_slice(&bytes) {
                Ok(value) => Ok(Payload::Json(value)),
                Err(e) => Err(CacheError::Serialization {
                    key: key.to_string(),
                    operation: SerializationOp::Decode,
                    source: Box::new(e),
                    recovery_hint: RecoveryHint::ClearAndRetry,
                }),
            },
        }
    }

    /// Size of the serialized payload in bytes
    pub fn byte_size(&self) -> Result<u64> {
        match self {
            Payload::Binary(bytes) => Ok(bytes.len() as u64),
            Payload::Text(text) => Ok(text.len() as u64),
            Payload::Json(_) => self.to_bytes().map(|b| b.len() as u64),
        }
    }

    /// MIME type used when the payload is served back as a response
    pub fn content_type(&self) -> &'static str {
        match self {
            Payload::Binary(_) => "application/octet-stream",
            Payload::Text(_) => "text/plain; charset=utf-8",
            Payload::Json(_) => "application/json",
        }
    }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self {
        Payload::Binary(bytes)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Binary(Bytes::from(bytes))
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Payload::Json(value)
    }
}

/// Everything known about an entry except its payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Fully-qualified fetch URL
    pub key: String,
    pub kind: ResourceKind,
    /// Milliseconds since the Unix epoch of the last write
    pub stored_at: u64,
    pub byte_size: u64,
    pub encoding: PayloadEncoding,
    /// Hex SHA-256 of the serialized payload; empty for in-memory entries
    #[serde(default)]
    pub content_hash: String,
}

impl EntryMetadata {
    /// Age of the entry at `now`, saturating at zero for clock skew
    pub fn age_millis(&self, now: u64) -> u64 {
        now.saturating_sub(self.stored_at)
    }

    pub fn is_expired(&self, now: u64, retention_millis: u64) -> bool {
        self.age_millis(now) >= retention_millis
    }
}

/// One cached network resource
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub metadata: EntryMetadata,
    pub payload: Payload,
}

impl CacheEntry {
    /// Build an entry stamped at `stored_at`; the size is measured here, once
    pub fn new(
        key: impl Into<String>,
        payload: Payload,
        kind: ResourceKind,
        stored_at: u64,
    ) -> Result<Self> {
        let key = key.into();
        let byte_size = match payload.byte_size() {
            Ok(size) => size,
            Err(CacheError::Serialization {
                operation,
                source,
                recovery_hint,
                ..
            }) => {
                return Err(CacheError::Serialization {
                    key,
                    operation,
                    source,
                    recovery_hint,
                })
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            metadata: EntryMetadata {
                key,
                kind,
                stored_at,
                byte_size,
                encoding: payload.encoding(),
                content_hash: String::new(),
            },
            payload,
        })
    }

    pub fn key(&self) -> &str {
        &self.metadata.key
    }
}
