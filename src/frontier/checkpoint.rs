//! Checkpoint file format
//!
//! ```json
//! {
//!   "url_queue": [["https://example.com/a", 1]],
//!   "visited_urls": ["https://example.com/"],
//!   "pending_urls": ["https://example.com/a"],
//!   "stats": {"total_discovered": 2, "total_visited": 1, "total_skipped": 0},
//!   "max_depth": 3
//! }
//! ```
//!
//! Depths written as strings (`["url", "1"]`) are accepted on load.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors reading or writing checkpoint files
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed checkpoint: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Inconsistent checkpoint: {0}")]
    Invalid(String),
}

impl CheckpointError {
    /// Returns true if the checkpoint file simply does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

/// One queued URL, serialized as a `[url, depth]` pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedUrl(pub String, #[serde(deserialize_with = "depth_from_any")] pub u32);

/// Frontier counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontierStats {
    pub total_discovered: u64,
    pub total_visited: u64,
    pub total_skipped: u64,
    #[serde(default)]
    pub total_failed: u64,
}

/// Serializable snapshot of a frontier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub url_queue: Vec<QueuedUrl>,
    pub visited_urls: Vec<String>,
    pub pending_urls: Vec<String>,
    pub stats: FrontierStats,
    #[serde(deserialize_with = "depth_from_any")]
    pub max_depth: u32,
    /// Failure reason per URL
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub failed_urls: BTreeMap<String, String>,
}

impl Checkpoint {
    /// Reads a checkpoint file
    pub fn read(path: &Path) -> Result<Self, CheckpointError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Writes the checkpoint atomically (temp file, then rename)
    pub fn write(&self, path: &Path) -> Result<(), CheckpointError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = Path::new(&tmp);

        std::fs::write(tmp, json)?;
        std::fs::rename(tmp, path)?;
        Ok(())
    }
}

fn depth_from_any<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDepth {
        Number(u32),
        Text(String),
    }

    match RawDepth::deserialize(deserializer)? {
        RawDepth::Number(depth) => Ok(depth),
        RawDepth::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid depth '{}'", text))),
    }
}
