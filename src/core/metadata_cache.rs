//! Disk-backed cache of archive metadata.
//!
//! Opening a zip package to read its manifest and icon is by far the most
//! expensive step of discovery, so the manifest text and icon bytes are kept
//! on disk keyed by the archive's normalized path. An entry is only trusted
//! while the archive's length and last write time match what was recorded.
//! There is no content hashing: an in-place edit that preserves both values
//! goes unnoticed.
//!
//! Layout under the cache root:
//!
//! ```text
//! index.toml
//! entries/{mod id}/{version}/{hash of source path}.json
//! entries/{mod id}/{version}/{hash of source path}.png
//! ```
//!
//! Every failure in here is logged and swallowed; callers see a miss.

use crate::models::cache_dto::{CacheEntry, CacheIndex, CachedManifest, FileStamp};
use crate::models::paths::CachePathRules;
use crate::utils::file::FileUtils;
use crate::utils::id::{hash_id, sanitize_segment};
use crate::utils::toml::Toml;
use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::Mutex;
use tracing::{debug, warn};

const INDEX_VERSION: u32 = 1;

pub struct MetadataCache {
    root: Utf8PathBuf,
    paths: CachePathRules,
    // Lazily loaded; `None` until first use. The lock spans each whole
    // read-modify-write of the index.
    index: Mutex<Option<CacheIndex>>,
}

impl MetadataCache {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        let root = root.into();
        Self {
            paths: CachePathRules::new(&root),
            root,
            index: Mutex::new(None),
        }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Returns the cached manifest and icon for `source` if the entry was
    /// recorded for exactly this `stamp`. A stale or broken entry is evicted.
    pub fn try_get(&self, source: &Utf8Path, stamp: FileStamp) -> Option<CachedManifest> {
        let key = Self::key(source);
        self.with_index(|index| {
            let entry = index.entries.get(&key)?.clone();

            if !entry.matches(stamp) {
                debug!(source = %key, "Cache entry is stale, evicting");
                self.evict(index, &key);
                return None;
            }

            match self.read_payload(&entry) {
                Some(hit) => Some(hit),
                None => {
                    debug!(source = %key, "Cache payload unreadable, evicting");
                    self.evict(index, &key);
                    None
                }
            }
        })
    }

    /// Records manifest text and icon bytes for `source`. Never fails; a
    /// payload that cannot be written leaves the index untouched.
    pub fn store(
        &self,
        source: &Utf8Path,
        stamp: FileStamp,
        mod_id: &str,
        version: Option<&str>,
        manifest_json: &str,
        icon: Option<&[u8]>,
    ) {
        let key = Self::key(source);
        let dir = format!(
            "{}/{}/{}",
            CachePathRules::default().entries,
            sanitize_segment(mod_id),
            sanitize_segment(version.unwrap_or("unversioned"))
        );
        let stem = hash_id(&key);
        let manifest_file = format!("{dir}/{stem}.json");
        let icon_file = icon.map(|_| format!("{dir}/{stem}.png"));

        self.with_index(|index| {
            let written = FileUtils::write_atomic(&self.root.join(&manifest_file), manifest_json.as_bytes())
                .and_then(|_| match (&icon_file, icon) {
                    (Some(rel), Some(bytes)) => FileUtils::write_atomic(&self.root.join(rel), bytes),
                    _ => Ok(()),
                });

            if let Err(e) = written {
                warn!(source = %key, error = %e, "Failed to write cache payload");
                return;
            }

            let entry = CacheEntry {
                mod_id: mod_id.to_string(),
                version: version.map(str::to_string),
                manifest_file,
                icon_file,
                length: stamp.length,
                last_write_ticks: stamp.last_write_ticks,
            };

            if let Some(old) = index.entries.insert(key.clone(), entry.clone()) {
                self.remove_payload_except(&old, &entry);
            }
            self.persist(index);
        });
    }

    /// Removes the entry for `source`, if any.
    pub fn invalidate(&self, source: &Utf8Path) {
        let key = Self::key(source);
        self.with_index(|index| self.evict(index, &key));
    }

    /// Deletes the whole cache root.
    pub fn clear(&self) {
        let mut guard = self.index.lock();
        if let Err(e) = std::fs::remove_dir_all(&self.root) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(root = %self.root, error = %e, "Failed to clear metadata cache");
            }
        }
        *guard = Some(CacheIndex::default());
    }

    pub fn len(&self) -> usize {
        self.with_index(|index| index.entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key(source: &Utf8Path) -> String {
        FileUtils::normalize(source).into_string()
    }

    fn with_index<R>(&self, f: impl FnOnce(&mut CacheIndex) -> R) -> R {
        let mut guard = self.index.lock();
        let index = guard.get_or_insert_with(|| self.load_index());
        f(index)
    }

    fn load_index(&self) -> CacheIndex {
        if !self.paths.index.exists() {
            return CacheIndex::default();
        }

        match Toml::read::<CacheIndex>(&self.paths.index) {
            Ok(index) if index.version == INDEX_VERSION => index,
            Ok(index) => {
                debug!(found = index.version, "Ignoring cache index from another format version");
                CacheIndex::default()
            }
            Err(e) => {
                warn!(path = %self.paths.index, error = %e, "Cache index unreadable, starting empty");
                CacheIndex::default()
            }
        }
    }

    fn persist(&self, index: &mut CacheIndex) {
        index.version = INDEX_VERSION;
        if let Err(e) = Toml::write(&self.paths.index, &*index) {
            warn!(path = %self.paths.index, error = %e, "Failed to persist cache index");
        }
    }

    fn read_payload(&self, entry: &CacheEntry) -> Option<CachedManifest> {
        let manifest_json = std::fs::read_to_string(self.root.join(&entry.manifest_file)).ok()?;
        let icon = match &entry.icon_file {
            Some(rel) => Some(std::fs::read(self.root.join(rel)).ok()?),
            None => None,
        };
        Some(CachedManifest {
            manifest_json,
            icon,
        })
    }

    fn evict(&self, index: &mut CacheIndex, key: &str) {
        if let Some(old) = index.entries.remove(key) {
            self.remove_payload(&old);
            self.persist(index);
        }
    }

    fn remove_payload(&self, entry: &CacheEntry) {
        for rel in std::iter::once(&entry.manifest_file).chain(entry.icon_file.iter()) {
            let _ = std::fs::remove_file(self.root.join(rel));
        }
    }

    fn remove_payload_except(&self, old: &CacheEntry, keep: &CacheEntry) {
        let kept = [Some(&keep.manifest_file), keep.icon_file.as_ref()];
        for rel in std::iter::once(&old.manifest_file).chain(old.icon_file.iter()) {
            if !kept.contains(&Some(rel)) {
                let _ = std::fs::remove_file(self.root.join(rel));
            }
        }
    }
}
