use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::Metadata;
use std::time::{SystemTime, UNIX_EPOCH};

/// File identity used for cache staleness checks: length plus last write time
/// in 100ns ticks since the Unix epoch (UTC).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FileStamp {
    pub length: u64,
    pub last_write_ticks: i64,
}

impl FileStamp {
    pub fn new(length: u64, modified: SystemTime) -> Self {
        Self {
            length,
            last_write_ticks: to_ticks(modified),
        }
    }

    pub fn from_metadata(meta: &Metadata) -> Self {
        let modified = meta.modified().unwrap_or(UNIX_EPOCH);
        Self::new(meta.len(), modified)
    }

    /// Reads the stamp of a file, `None` if it is missing or not a regular file.
    pub fn read(path: impl AsRef<std::path::Path>) -> Option<Self> {
        std::fs::metadata(path)
            .ok()
            .filter(|m| m.is_file())
            .map(|m| Self::from_metadata(&m))
    }
}

fn to_ticks(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => (d.as_nanos() / 100) as i64,
        Err(e) => -((e.duration().as_nanos() / 100) as i64),
    }
}

/// One persisted disk-cache record. Payload paths are relative to the cache root.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry {
    pub mod_id: String,
    pub version: Option<String>,
    pub manifest_file: String,
    pub icon_file: Option<String>,
    pub length: u64,
    pub last_write_ticks: i64,
}

impl CacheEntry {
    pub fn matches(&self, stamp: FileStamp) -> bool {
        self.length == stamp.length && self.last_write_ticks == stamp.last_write_ticks
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheIndex {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub entries: BTreeMap<String, CacheEntry>,
}

/// Payload returned by a disk cache hit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedManifest {
    pub manifest_json: String,
    pub icon: Option<Vec<u8>>,
}
