use crate::models::descriptor::SourceKind;
use crate::utils::file::FileUtils;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One filesystem entry to examine, tagged with its discovery position.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ModSource {
    pub order: usize,
    pub path: Utf8PathBuf,
    pub kind: SourceKind,
}

impl ModSource {
    /// Name used when the manifest cannot provide one: folder name or file stem.
    pub fn fallback_name(&self) -> String {
        let name = match self.kind {
            SourceKind::Folder => self.path.file_name(),
            _ => self.path.file_stem(),
        };
        name.unwrap_or("mod").to_string()
    }
}

/// Deduplicated, ordered list of sources. `order` always equals the position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceListing {
    sources: Vec<ModSource>,
    // Identity keys of everything in `sources`.
    seen: HashSet<String>,
}

impl SourceListing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a source, returning false when the same path is already
    /// listed. Paths compare by [`FileUtils::identity_key`].
    pub fn push(&mut self, path: Utf8PathBuf, kind: SourceKind) -> bool {
        if !self.seen.insert(FileUtils::identity_key(&path)) {
            return false;
        }
        self.sources.push(ModSource {
            order: self.sources.len(),
            path,
            kind,
        });
        true
    }

    pub fn sources(&self) -> &[ModSource] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn into_sources(self) -> Vec<ModSource> {
        self.sources
    }
}

impl FromIterator<(Utf8PathBuf, SourceKind)> for SourceListing {
    fn from_iter<T: IntoIterator<Item = (Utf8PathBuf, SourceKind)>>(iter: T) -> Self {
        let mut listing = SourceListing::new();
        for (path, kind) in iter {
            listing.push(path, kind);
        }
        listing
    }
}
