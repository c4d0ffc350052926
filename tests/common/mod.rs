#![allow(dead_code)]

use camino::{Utf8Path, Utf8PathBuf};
use modlist_keeper::config::ModSearchSettings;
use modlist_keeper::core::dir_cache::DirectoryEntryCache;
use modlist_keeper::core::manifest::ManifestParser;
use modlist_keeper::core::metadata_cache::MetadataCache;
use modlist_keeper::core::mod_reader::ModReader;
use std::fs;
use std::io::Write;
use std::sync::Arc;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// Temp dir plus its UTF-8 path. Keep the `TempDir` alive for the test.
pub fn utf8_tempdir() -> (TempDir, Utf8PathBuf) {
    let tmp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
    (tmp, root)
}

pub fn manifest_json(id: &str, version: &str, deps: &[(&str, &str)]) -> String {
    let deps = deps
        .iter()
        .map(|(d, v)| format!(r#""{d}": "{v}""#))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"{{"type": "code", "modid": "{id}", "name": "{id} mod", "version": "{version}", "dependencies": {{ {deps} }}}}"#
    )
}

/// Mock a mod folder with a `modinfo.json`.
pub fn write_folder_mod(parent: &Utf8Path, dir_name: &str, manifest: &str) -> Utf8PathBuf {
    let dir = parent.join(dir_name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("modinfo.json"), manifest).unwrap();
    dir
}

pub fn write_zip_mod(path: &Utf8Path, entries: &[(&str, &[u8])]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut writer = zip::ZipWriter::new(fs::File::create(path).unwrap());
    for (name, data) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap();
}

pub fn reader(cache_root: &Utf8Path) -> (ModReader, Arc<MetadataCache>, Arc<DirectoryEntryCache>) {
    let metadata = Arc::new(MetadataCache::new(cache_root.to_path_buf()));
    let dirs = Arc::new(DirectoryEntryCache::new());
    let reader = ModReader::new(
        ManifestParser::new(None),
        Arc::clone(&metadata),
        Arc::clone(&dirs),
    );
    (reader, metadata, dirs)
}

#[derive(Clone, Debug, Default)]
pub struct TestSettings {
    pub data_dir: Utf8PathBuf,
    pub install_dir: Option<Utf8PathBuf>,
    pub extra: Vec<String>,
    pub bases: Vec<Utf8PathBuf>,
}

impl ModSearchSettings for TestSettings {
    fn data_directory(&self) -> Utf8PathBuf {
        self.data_dir.clone()
    }

    fn install_directory(&self) -> Option<Utf8PathBuf> {
        self.install_dir.clone()
    }

    fn extra_mod_paths(&self) -> Vec<String> {
        self.extra.clone()
    }

    fn search_base_candidates(&self) -> Vec<Utf8PathBuf> {
        self.bases.clone()
    }
}
