use crate::models::error::ModError;
use crate::models::paths::{DEFAULT_ICON_FILE, MANIFEST_FILE};
use camino::Utf8Path;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};

/// Normalizes an archive entry path: forward slashes, no leading `./`
/// segments, no single leading `/`, lowercase.
pub fn normalize_entry_path(path: &str) -> String {
    let mut p = path.replace('\\', "/");
    while let Some(rest) = p.strip_prefix("./") {
        p = rest.to_string();
    }
    if let Some(rest) = p.strip_prefix('/') {
        p = rest.to_string();
    }
    p.to_lowercase()
}

/// Largest entry the index will read into memory. Manifests and icons are
/// far below this.
pub const MAX_ENTRY_BYTES: u64 = 16 * 1024 * 1024;

fn bare_file_name(normalized: &str) -> &str {
    normalized.rsplit('/').next().unwrap_or(normalized)
}

/// Lookup tables over the entries of a zip package, by normalized path and
/// by bare file name. The first entry registered under a key wins.
pub struct ArchiveIndex<R: Read + Seek = File> {
    archive: zip::ZipArchive<R>,
    by_path: HashMap<String, usize>,
    by_file_name: HashMap<String, usize>,
    entry_limit: u64,
}

impl ArchiveIndex<File> {
    pub fn open(path: &Utf8Path) -> Result<Self, ModError> {
        Self::new(File::open(path)?)
    }
}

impl<R: Read + Seek> ArchiveIndex<R> {
    pub fn new(reader: R) -> Result<Self, ModError> {
        let mut archive = zip::ZipArchive::new(reader)?;
        let mut by_path = HashMap::new();
        let mut by_file_name = HashMap::new();

        for i in 0..archive.len() {
            let entry = archive.by_index_raw(i)?;
            if entry.is_dir() {
                continue;
            }
            let normalized = normalize_entry_path(entry.name());
            by_file_name
                .entry(bare_file_name(&normalized).to_string())
                .or_insert(i);
            by_path.entry(normalized).or_insert(i);
        }

        Ok(Self {
            archive,
            by_path,
            by_file_name,
            entry_limit: MAX_ENTRY_BYTES,
        })
    }

    /// Overrides [`MAX_ENTRY_BYTES`] for this index.
    pub fn with_entry_limit(mut self, limit: u64) -> Self {
        self.entry_limit = limit;
        self
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    /// Entry index for a relative path, falling back to the bare file name.
    pub fn locate(&self, relative: &str) -> Option<usize> {
        let normalized = normalize_entry_path(relative);
        self.by_path
            .get(&normalized)
            .or_else(|| self.by_file_name.get(bare_file_name(&normalized)))
            .copied()
    }

    pub fn read(&mut self, relative: &str) -> Result<Option<Vec<u8>>, ModError> {
        let Some(index) = self.locate(relative) else {
            return Ok(None);
        };
        let limit = self.entry_limit;
        let entry = self.archive.by_index(index)?;
        let name = entry.name().to_string();

        // The declared size comes from the archive itself and is only a hint.
        let mut buf = Vec::with_capacity(entry.size().min(limit) as usize);
        entry
            .take(limit.saturating_add(1))
            .read_to_end(&mut buf)
            .map_err(|e| ModError::ArchiveError(format!("{name}: {e}")))?;

        if buf.len() as u64 > limit {
            return Err(ModError::ArchiveError(format!(
                "{name} is larger than {limit} bytes"
            )));
        }
        Ok(Some(buf))
    }

    /// The package manifest. A root-level entry is preferred; any entry with
    /// the manifest's file name is accepted otherwise.
    pub fn read_manifest(&mut self) -> Result<String, ModError> {
        let bytes = self
            .read(MANIFEST_FILE)?
            .ok_or_else(|| ModError::ManifestNotFound("archive".into()))?;
        String::from_utf8(bytes)
            .map_err(|e| ModError::ParseError(format!("Manifest is not valid UTF-8: {e}")))
    }

    /// Icon bytes from the declared path (if any) or the default icon name.
    pub fn read_icon(&mut self, declared: Option<&str>) -> Option<Vec<u8>> {
        let declared = declared.and_then(crate::core::icon::sanitize_relative);
        declared
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(DEFAULT_ICON_FILE))
            .find_map(|candidate| self.read(candidate).ok().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn build_zip(entries: &[(&str, &[u8])]) -> Cursor<Vec<u8>> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
        let mut cursor = writer.finish().unwrap();
        cursor.set_position(0);
        cursor
    }

    #[test]
    fn normalizes_entry_paths() {
        assert_eq!(normalize_entry_path("./././a/B.png"), "a/b.png");
        assert_eq!(normalize_entry_path("/modinfo.json"), "modinfo.json");
        assert_eq!(normalize_entry_path(r"assets\icon.png"), "assets/icon.png");
    }

    #[test]
    fn locates_by_path_then_file_name() {
        let zip = build_zip(&[
            ("nested/modinfo.json", b"{}"),
            ("assets/icons/modicon.png", b"png"),
        ]);
        let mut index = ArchiveIndex::new(zip).unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.read_manifest().unwrap(), "{}");
        assert_eq!(index.read_icon(Some("./assets/icons/modicon.png")), Some(b"png".to_vec()));
        assert_eq!(index.read_icon(Some("elsewhere/modicon.png")), Some(b"png".to_vec()));
        assert_eq!(index.read("missing.txt").unwrap(), None);
    }

    #[test]
    fn first_registered_entry_wins() {
        let zip = build_zip(&[
            ("modinfo.json", b"root"),
            ("sub/modinfo.json", b"nested"),
            ("other/modinfo.json", b"other"),
        ]);
        let mut index = ArchiveIndex::new(zip).unwrap();
        assert_eq!(index.read_manifest().unwrap(), "root");
        assert_eq!(index.read("x/modinfo.json").unwrap(), Some(b"root".to_vec()));
    }

    #[test]
    fn missing_manifest_is_reported() {
        let zip = build_zip(&[("readme.txt", b"hi")]);
        let mut index = ArchiveIndex::new(zip).unwrap();
        assert!(matches!(index.read_manifest(), Err(ModError::ManifestNotFound(_))));
    }

    /// Rewrites the single central directory record so it declares
    /// `declared` uncompressed bytes through a zip64 extra field.
    fn forge_uncompressed_size(bytes: &[u8], declared: u64) -> Vec<u8> {
        let find = |sig: &[u8]| bytes.windows(4).rposition(|w| w == sig).unwrap();
        let central = find(b"PK\x01\x02");
        let eocd = find(b"PK\x05\x06");
        let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]) as usize;

        let name_len = u16_at(central + 28);
        let extra_len = u16_at(central + 30);
        let insert_at = central + 46 + name_len + extra_len;

        let mut extra = Vec::new();
        extra.extend_from_slice(&1u16.to_le_bytes());
        extra.extend_from_slice(&8u16.to_le_bytes());
        extra.extend_from_slice(&declared.to_le_bytes());

        let mut out = bytes.to_vec();
        out[central + 24..central + 28].copy_from_slice(&u32::MAX.to_le_bytes());
        out[central + 30..central + 32].copy_from_slice(&((extra_len + extra.len()) as u16).to_le_bytes());
        let cd_size = u32::from_le_bytes(out[eocd + 12..eocd + 16].try_into().unwrap());
        out[eocd + 12..eocd + 16].copy_from_slice(&(cd_size + extra.len() as u32).to_le_bytes());
        out.splice(insert_at..insert_at, extra);
        out
    }

    #[test]
    fn forged_entry_size_does_not_drive_allocation() {
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("modinfo.json", options).unwrap();
        writer.write_all(br#"{"modid":"x"}"#).unwrap();
        let honest = writer.finish().unwrap().into_inner();

        let forged = forge_uncompressed_size(&honest, 1 << 60);
        let mut index = ArchiveIndex::new(Cursor::new(forged)).unwrap();
        match index.read_manifest() {
            Ok(text) => assert_eq!(text, r#"{"modid":"x"}"#),
            Err(e) => assert!(matches!(e, ModError::ArchiveError(_)), "{e}"),
        }
    }

    #[test]
    fn oversized_entry_is_an_archive_error() {
        let zip = build_zip(&[("modinfo.json", b"0123456789")]);
        let mut index = ArchiveIndex::new(zip).unwrap().with_entry_limit(4);
        assert!(matches!(index.read_manifest(), Err(ModError::ArchiveError(_))));
        assert_eq!(index.read_icon(None), None);
    }

    #[test]
    fn corrupt_archive_is_an_error() {
        let result = ArchiveIndex::new(Cursor::new(b"not a zip".to_vec()));
        assert!(matches!(result, Err(ModError::ArchiveError(_))));
    }
}
