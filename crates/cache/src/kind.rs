//! Coarse classification of cached resources, used for statistics only

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What kind of asset a cached URL points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Wasm,
    Model,
    Data,
    Script,
    Unknown,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Wasm,
        ResourceKind::Model,
        ResourceKind::Data,
        ResourceKind::Script,
        ResourceKind::Unknown,
    ];

    /// Best-effort substring match on the URL; the first matching rule wins
    pub fn classify(url: &str) -> Self {
        let url = url.to_ascii_lowercase();
        if url.contains(".wasm") {
            ResourceKind::Wasm
        } else if url.contains(".onnx") || url.contains("model") {
            ResourceKind::Model
        } else if url.contains(".bin") || url.contains("data") {
            ResourceKind::Data
        } else if url.contains(".js") {
            ResourceKind::Script
        } else {
            ResourceKind::Unknown
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Wasm => "wasm",
            ResourceKind::Model => "model",
            ResourceKind::Data => "data",
            ResourceKind::Script => "script",
            ResourceKind::Unknown => "unknown",
        }
    }
}

impl Default for ResourceKind {
    fn default() -> Self {
        ResourceKind::Unknown
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wasm" => Ok(ResourceKind::Wasm),
            "model" => Ok(ResourceKind::Model),
            "data" => Ok(ResourceKind::Data),
            "script" => Ok(ResourceKind::Script),
            "unknown" => Ok(ResourceKind::Unknown),
            other => Err(format!("unknown resource kind '{other}'")),
        }
    }
}
