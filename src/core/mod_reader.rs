use crate::core::archive::ArchiveIndex;
use crate::core::dir_cache::DirectoryEntryCache;
use crate::core::icon::resolve_folder_icon;
use crate::core::manifest::ManifestParser;
use crate::core::metadata_cache::MetadataCache;
use crate::models::cache_dto::FileStamp;
use crate::models::descriptor::{ModDescriptor, ModManifest, SourceKind};
use crate::models::error::ModError;
use crate::models::paths::MANIFEST_FILE;
use crate::models::source::ModSource;
use crate::utils::file::FileUtils;
use camino::Utf8Path;
use std::sync::Arc;
use tracing::debug;

/// Turns one discovered source into a descriptor. Implementations must not
/// panic on bad input: failures belong in the descriptor's `error`.
pub trait SourceProcessor: Send + Sync {
    fn process(&self, source: &ModSource) -> ModDescriptor;
}

/// The standard processor: folders, zip packages and unsupported code files.
pub struct ModReader {
    parser: ManifestParser,
    metadata_cache: Arc<MetadataCache>,
    dir_cache: Arc<DirectoryEntryCache>,
    fallback_icon: Option<Arc<[u8]>>,
}

impl ModReader {
    pub fn new(
        parser: ManifestParser,
        metadata_cache: Arc<MetadataCache>,
        dir_cache: Arc<DirectoryEntryCache>,
    ) -> Self {
        Self {
            parser,
            metadata_cache,
            dir_cache,
            fallback_icon: None,
        }
    }

    /// Icon handed out when a mod ships none.
    pub fn with_fallback_icon(mut self, icon: impl Into<Arc<[u8]>>) -> Self {
        self.fallback_icon = Some(icon.into());
        self
    }

    fn read_folder(&self, source: &ModSource) -> ModDescriptor {
        let dir = &source.path;
        let fallback = source.fallback_name();

        let Some(manifest_path) = FileUtils::find_file_ignore_case(dir, MANIFEST_FILE) else {
            self.dir_cache.invalidate(dir);
            return ModDescriptor::failed(
                &fallback,
                dir.clone(),
                SourceKind::Folder,
                ModError::ManifestNotFound(dir.to_string()).to_string(),
            );
        };

        let stamp = FileStamp::read(&manifest_path);
        if let Some(hit) = stamp.and_then(|s| self.dir_cache.try_get(dir, s)) {
            debug!(dir = %dir, "Folder mod served from memory cache");
            return hit;
        }

        let parsed = std::fs::read_to_string(&manifest_path)
            .map_err(ModError::from)
            .and_then(|json| self.parser.parse(&json, &fallback));

        match (parsed, stamp) {
            (Ok(manifest), stamp) => {
                let icon = resolve_folder_icon(
                    dir,
                    manifest.icon_path.as_deref(),
                    self.fallback_icon.as_deref(),
                );
                let descriptor =
                    ModDescriptor::from_manifest(manifest, dir.clone(), SourceKind::Folder, icon.bytes);

                match stamp {
                    Some(stamp) => self.dir_cache.store(dir, stamp, icon.probes, &descriptor),
                    None => self.dir_cache.invalidate(dir),
                }
                descriptor
            }
            (Err(e), _) => {
                self.dir_cache.invalidate(dir);
                ModDescriptor::failed(&fallback, dir.clone(), SourceKind::Folder, e.to_string())
            }
        }
    }

    fn read_archive(&self, source: &ModSource) -> ModDescriptor {
        let path = &source.path;
        let fallback = source.fallback_name();
        let stamp = FileStamp::read(path);

        if let Some(hit) = stamp.and_then(|s| self.metadata_cache.try_get(path, s)) {
            match self.parser.parse(&hit.manifest_json, &fallback) {
                Ok(manifest) => {
                    debug!(archive = %path, "Archive metadata served from disk cache");
                    return self.archive_descriptor(manifest, path, hit.icon);
                }
                Err(e) => {
                    debug!(archive = %path, error = %e, "Cached manifest no longer parses");
                    self.metadata_cache.invalidate(path);
                }
            }
        }

        match self.load_archive(path, &fallback) {
            Ok((json, manifest, icon)) => {
                if let Some(stamp) = stamp {
                    self.metadata_cache.store(
                        path,
                        stamp,
                        &manifest.mod_id,
                        manifest.version.as_deref(),
                        &json,
                        icon.as_deref(),
                    );
                }
                self.archive_descriptor(manifest, path, icon)
            }
            Err(e) => ModDescriptor::failed(&fallback, path.clone(), SourceKind::ZipArchive, e.to_string()),
        }
    }

    fn load_archive(
        &self,
        path: &Utf8Path,
        fallback: &str,
    ) -> Result<(String, ModManifest, Option<Vec<u8>>), ModError> {
        let mut index = ArchiveIndex::open(path)?;
        let json = index.read_manifest().map_err(|e| match e {
            ModError::ManifestNotFound(_) => ModError::ManifestNotFound(path.to_string()),
            e => e,
        })?;
        let manifest = self.parser.parse(&json, fallback)?;
        let icon = index.read_icon(manifest.icon_path.as_deref());
        Ok((json, manifest, icon))
    }

    fn archive_descriptor(
        &self,
        manifest: ModManifest,
        path: &Utf8Path,
        icon: Option<Vec<u8>>,
    ) -> ModDescriptor {
        let icon = icon.or_else(|| self.fallback_icon.as_deref().map(<[u8]>::to_vec));
        ModDescriptor::from_manifest(manifest, path.to_path_buf(), SourceKind::ZipArchive, icon)
    }

    fn read_code(&self, source: &ModSource) -> ModDescriptor {
        let reason = match source.kind {
            SourceKind::SourceCode => "Loose source files (.cs) are not supported as mods; they must be packaged with a modinfo.json",
            _ => "Loose assemblies (.dll) are not supported as mods; they must be packaged with a modinfo.json",
        };
        ModDescriptor::failed(&source.fallback_name(), source.path.clone(), source.kind, reason)
    }
}

impl SourceProcessor for ModReader {
    fn process(&self, source: &ModSource) -> ModDescriptor {
        match source.kind {
            SourceKind::Folder => self.read_folder(source),
            SourceKind::ZipArchive => self.read_archive(source),
            SourceKind::SourceCode | SourceKind::Assembly => self.read_code(source),
        }
    }
}
