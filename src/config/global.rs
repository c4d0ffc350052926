// src/config/global.rs
use crate::config::{DisabledMods, ModSearchSettings, APP_NAME};
use crate::core::discovery::DEFAULT_BATCH_SIZE;
use camino::Utf8PathBuf;
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Folder name the game uses for its per-user data under the config dir.
const GAME_DATA_DIR_NAME: &str = "VintagestoryData";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RemoteStoreConfig {
    pub base_url: String,
    pub namespace: String,
    pub auth_token: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GlobalConfig {
    pub data_dir: Utf8PathBuf,
    pub install_dir: Option<Utf8PathBuf>,
    pub extra_mod_paths: Vec<String>,
    pub search_bases: Vec<Utf8PathBuf>,
    /// Entries are `modid` (any version) or `modid@version`.
    pub disabled_mods: Vec<String>,
    /// Token picked out of manifests' `versionmap`, e.g. `1.21`.
    pub target_game_version: Option<String>,
    pub batch_size: usize,
    pub cache_dir: Option<Utf8PathBuf>,
    pub remote: Option<RemoteStoreConfig>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        let data_dir = BaseDirs::new()
            .and_then(|dirs| Utf8PathBuf::from_path_buf(dirs.config_dir().to_path_buf()).ok())
            .map(|dir| dir.join(GAME_DATA_DIR_NAME))
            .unwrap_or_else(|| Utf8PathBuf::from(GAME_DATA_DIR_NAME));

        Self {
            data_dir: data_dir.clone(),
            install_dir: None,
            extra_mod_paths: Vec::new(),
            search_bases: vec![data_dir],
            disabled_mods: Vec::new(),
            target_game_version: None,
            batch_size: DEFAULT_BATCH_SIZE,
            cache_dir: None,
            remote: None,
        }
    }
}

impl GlobalConfig {
    pub fn load() -> GlobalConfig {
        confy::load(APP_NAME, "config").unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            GlobalConfig::default()
        })
    }

    pub fn save(&self) {
        if let Err(e) = confy::store(APP_NAME, "config", self) {
            warn!(error = %e, "Failed to save config");
        }
    }

    /// Disk cache root: the configured override or the platform cache dir.
    pub fn cache_root(&self) -> Utf8PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            ProjectDirs::from("com", "martes", APP_NAME)
                .and_then(|dirs| Utf8PathBuf::from_path_buf(dirs.cache_dir().to_path_buf()).ok())
                .unwrap_or_else(|| self.data_dir.join("Cache"))
                .join("ModMetadata")
        })
    }

    pub fn set_disabled(&mut self, mod_id: &str, version: Option<&str>, disabled: bool) {
        let entry = match version {
            Some(v) => format!("{mod_id}@{v}"),
            None => mod_id.to_string(),
        };
        self.disabled_mods.retain(|e| !e.eq_ignore_ascii_case(&entry));
        if disabled {
            self.disabled_mods.push(entry);
        }
    }
}

impl ModSearchSettings for GlobalConfig {
    fn data_directory(&self) -> Utf8PathBuf {
        self.data_dir.clone()
    }

    fn install_directory(&self) -> Option<Utf8PathBuf> {
        self.install_dir.clone()
    }

    fn extra_mod_paths(&self) -> Vec<String> {
        self.extra_mod_paths.clone()
    }

    fn search_base_candidates(&self) -> Vec<Utf8PathBuf> {
        self.search_bases.clone()
    }
}

impl DisabledMods for GlobalConfig {
    fn is_disabled(&self, mod_id: &str, version: Option<&str>) -> bool {
        self.disabled_mods.iter().any(|entry| match entry.split_once('@') {
            Some((id, v)) => id.eq_ignore_ascii_case(mod_id) && version == Some(v),
            None => entry.eq_ignore_ascii_case(mod_id),
        })
    }
}
