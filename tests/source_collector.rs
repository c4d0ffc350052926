mod common;

use common::{manifest_json, utf8_tempdir, write_folder_mod, write_zip_mod, TestSettings};
use modlist_keeper::config::global::GlobalConfig;
use modlist_keeper::core::load_status::DUPLICATE_ERROR;
use modlist_keeper::core::registry::ModRegistry;
use modlist_keeper::core::source_collector::{latest_log_file, SourceCollector};
use modlist_keeper::models::descriptor::SourceKind;
use modlist_keeper::utils::file::FileUtils;
use std::time::{Duration, SystemTime};
use tokio_util::sync::CancellationToken;

fn write_log(path: &camino::Utf8Path, listed: &camino::Utf8Path, age_secs: u64) {
    std::fs::write(
        path,
        format!("[Notification] Will search the following paths for mods:\n[Notification] {listed}\n"),
    )
    .unwrap();
    let modified = SystemTime::now() - Duration::from_secs(age_secs);
    std::fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(modified)
        .unwrap();
}

#[test]
fn roots_come_from_data_dir_config_and_log() {
    let (_tmp, root) = utf8_tempdir();
    let root = FileUtils::normalize(&root);
    let data = root.join("data");
    let install = root.join("install");
    let base = root.join("base");
    for dir in [data.join("Mods"), install.join("Mods"), base.join("Extra"), root.join("FromLog")] {
        std::fs::create_dir_all(dir).unwrap();
    }

    std::fs::create_dir_all(data.join("Logs")).unwrap();
    std::fs::write(
        data.join("Logs/client-main.txt"),
        format!(
            "1.1.2025 10:00:00 [Notification] Will search the following paths for mods:\n\
             1.1.2025 10:00:00 [Notification]     {}\n\
             1.1.2025 10:00:00 [Notification]     {}\n\
             1.1.2025 10:00:00 [Notification]     {} (Not found?)\n\
             1.1.2025 10:00:00 [Notification] Found 0 mods\n",
            install.join("Mods"),
            data.join("Mods"),
            root.join("FromLog"),
        ),
    )
    .unwrap();

    let settings = TestSettings {
        data_dir: data.clone(),
        install_dir: Some(install.clone()),
        extra: vec!["Extra".into(), "  ".into()],
        bases: vec![root.join("missing-base"), base.clone()],
    };

    let roots = SourceCollector::new(&settings).search_roots();
    let names: Vec<_> = roots
        .iter()
        .map(|p| p.strip_prefix(&root).map(|r| r.to_string()).unwrap_or_else(|_| p.to_string()))
        .collect();
    assert_eq!(names, vec!["data/Mods", "base/Extra", "FromLog"]);
}

#[test]
fn newest_matching_log_wins() {
    let (_tmp, root) = utf8_tempdir();
    let root = FileUtils::normalize(&root);
    let data = root.join("data");
    let logs = data.join("Logs");
    std::fs::create_dir_all(&logs).unwrap();
    for dir in ["OldLog", "NewLog", "Unrelated"] {
        std::fs::create_dir_all(root.join(dir)).unwrap();
    }

    write_log(&logs.join("client-main.txt"), &root.join("OldLog"), 3600);
    write_log(&logs.join("server-main.txt"), &root.join("NewLog"), 60);
    // Newest of all, but not a game log.
    write_log(&logs.join("other.txt"), &root.join("Unrelated"), 0);

    assert_eq!(latest_log_file(&logs), Some(logs.join("server-main.txt")));

    let settings = TestSettings {
        data_dir: data.clone(),
        ..Default::default()
    };
    let roots = SourceCollector::new(&settings).search_roots();
    assert_eq!(roots, vec![data.join("Mods"), root.join("NewLog")]);
}

#[test]
fn collects_supported_entries_in_name_order() {
    let (_tmp, root) = utf8_tempdir();
    let mods = root.join("data/Mods");
    write_folder_mod(&mods, "beta", "{}");
    write_zip_mod(&mods.join("Alpha.zip"), &[("modinfo.json", b"{}")]);
    std::fs::write(mods.join("notes.txt"), "ignored").unwrap();
    std::fs::write(mods.join("Code.cs"), "class A {}").unwrap();
    std::fs::write(mods.join("Lib.dll"), [0u8; 4]).unwrap();

    let settings = TestSettings {
        data_dir: root.join("data"),
        ..Default::default()
    };
    let listing = SourceCollector::new(&settings).collect();

    let seen: Vec<_> = listing
        .sources()
        .iter()
        .map(|s| (s.order, s.path.file_name().unwrap().to_string(), s.kind))
        .collect();
    assert_eq!(
        seen,
        vec![
            (0, "Alpha.zip".to_string(), SourceKind::ZipArchive),
            (1, "beta".to_string(), SourceKind::Folder),
            (2, "Code.cs".to_string(), SourceKind::SourceCode),
            (3, "Lib.dll".to_string(), SourceKind::Assembly),
        ]
    );
}

#[test]
fn missing_data_dir_yields_nothing() {
    let (_tmp, root) = utf8_tempdir();
    let settings = TestSettings {
        data_dir: root.join("nowhere"),
        ..Default::default()
    };
    assert!(SourceCollector::new(&settings).collect().is_empty());
}

fn registry_config(root: &camino::Utf8Path) -> GlobalConfig {
    GlobalConfig {
        data_dir: root.join("data"),
        install_dir: None,
        extra_mod_paths: vec![root.join("more").to_string()],
        search_bases: Vec::new(),
        cache_dir: Some(root.join("cache")),
        batch_size: 2,
        ..GlobalConfig::default()
    }
}

fn populate(root: &camino::Utf8Path) {
    let mods = root.join("data/Mods");
    write_folder_mod(&mods, "a-lib", &manifest_json("lib", "1.0.0", &[]));
    write_folder_mod(&mods, "b-user", &manifest_json("user", "1.0.0", &[("lib", "1.0.0")]));
    write_zip_mod(
        &root.join("more/lib-copy.zip"),
        &[("modinfo.json", manifest_json("lib", "1.1.0", &[]).as_bytes())],
    );
}

#[test]
fn registry_discovers_with_load_status() {
    let (_tmp, root) = utf8_tempdir();
    populate(&root);

    let registry = ModRegistry::new(registry_config(&root));
    let mods = registry.discover();

    let ids: Vec<_> = mods.iter().map(|m| m.mod_id.as_str()).collect();
    assert_eq!(ids, vec!["lib", "user", "lib"]);
    assert!(mods[0].load_error.is_none());
    assert!(mods[1].load_error.is_none());
    assert_eq!(mods[2].load_error.as_deref(), Some(DUPLICATE_ERROR));
    assert_eq!(registry.metadata_cache().len(), 1);
    assert_eq!(registry.dir_cache().len(), 2);

    registry.config.lock().set_disabled("lib", None, true);
    let mods = registry.discover();
    assert!(mods[1].dependency_has_errors);

    registry.clear_cache();
    assert!(registry.metadata_cache().is_empty());
    assert!(registry.dir_cache().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn registry_streamed_matches_batch() {
    let (_tmp, root) = utf8_tempdir();
    populate(&root);

    let registry = ModRegistry::new(registry_config(&root));
    let streamed = registry.discover_streamed(CancellationToken::new()).await.unwrap();
    let batch = registry.discover();
    assert_eq!(streamed, batch);
}
