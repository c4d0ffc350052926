use crate::core::icon::IconProbe;
use crate::models::cache_dto::FileStamp;
use crate::models::descriptor::ModDescriptor;
use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Clone, Debug)]
struct DirCacheEntry {
    descriptor: ModDescriptor,
    manifest: FileStamp,
    icon_probes: Vec<IconProbe>,
}

/// In-memory cache of parsed folder mods, keyed by directory.
///
/// An entry is valid only while the manifest stamp matches and every icon
/// location probed when it was built still looks the same, including icons
/// that were absent and must still be absent.
#[derive(Default)]
pub struct DirectoryEntryCache {
    entries: Mutex<HashMap<Utf8PathBuf, DirCacheEntry>>,
}

impl DirectoryEntryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_get(&self, dir: &Utf8Path, manifest: FileStamp) -> Option<ModDescriptor> {
        let mut entries = self.entries.lock();
        let entry = entries.get(dir)?;

        if entry.manifest == manifest && entry.icon_probes.iter().all(IconProbe::is_current) {
            return Some(entry.descriptor.clone());
        }

        entries.remove(dir);
        None
    }

    pub fn store(
        &self,
        dir: &Utf8Path,
        manifest: FileStamp,
        icon_probes: Vec<IconProbe>,
        descriptor: &ModDescriptor,
    ) {
        let entry = DirCacheEntry {
            descriptor: descriptor.clone(),
            manifest,
            icon_probes,
        };
        self.entries.lock().insert(dir.to_path_buf(), entry);
    }

    pub fn invalidate(&self, dir: &Utf8Path) {
        self.entries.lock().remove(dir);
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
