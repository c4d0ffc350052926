use camino::Utf8PathBuf;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Mod ids shipped with the base game. They are never reported by discovery.
pub const BASE_GAME_MOD_IDS: [&str; 3] = ["game", "creative", "survival"];

/// Dependency ids that refer to the game itself rather than to another mod.
pub const CORE_DEPENDENCY_IDS: [&str; 3] = ["game", "creative", "survival"];

pub fn is_base_game_id(id: &str) -> bool {
    BASE_GAME_MOD_IDS.iter().any(|b| b.eq_ignore_ascii_case(id))
}

pub fn is_core_dependency_id(id: &str) -> bool {
    CORE_DEPENDENCY_IDS.iter().any(|b| b.eq_ignore_ascii_case(id))
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum SourceKind {
    Folder,
    ZipArchive,
    SourceCode,
    Assembly,
}

impl SourceKind {
    /// Classifies a file by extension. Directories are always `Folder`.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = name.rsplit_once('.')?.1;
        match ext.to_ascii_lowercase().as_str() {
            "zip" => Some(SourceKind::ZipArchive),
            "cs" => Some(SourceKind::SourceCode),
            "dll" => Some(SourceKind::Assembly),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum ModSide {
    Client,
    Server,
    Both,
}

impl ModSide {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "client" => Some(ModSide::Client),
            "server" => Some(ModSide::Server),
            "both" | "universal" => Some(ModSide::Both),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DependencyRecord {
    pub mod_id: String,
    pub version: String,
    pub is_core: bool,
}

impl DependencyRecord {
    pub fn new(mod_id: impl Into<String>, version: impl Into<String>) -> Self {
        let mod_id = mod_id.into();
        Self {
            is_core: is_core_dependency_id(&mod_id),
            mod_id,
            version: version.into(),
        }
    }
}

/// Manifest fields after parsing, before they are tied to a source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModManifest {
    pub mod_id: String,
    pub name: String,
    pub version: Option<String>,
    pub network_version: Option<String>,
    pub description: String,
    pub website: String,
    pub authors: Vec<String>,
    pub contributors: Vec<String>,
    pub dependencies: Vec<DependencyRecord>,
    pub icon_path: Option<String>,
    pub side: Option<ModSide>,
    pub required_on_client: Option<bool>,
    pub required_on_server: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ModDescriptor {
    pub mod_id: String,
    pub name: String,
    pub version: Option<String>,
    pub network_version: Option<String>,
    pub description: String,
    pub website: String,
    pub authors: Vec<String>,
    pub contributors: Vec<String>,
    pub dependencies: Vec<DependencyRecord>,
    pub source_path: Utf8PathBuf,
    pub source_kind: SourceKind,
    #[serde(skip)]
    pub icon: Option<Vec<u8>>,
    /// Metadata could not be read; the other fields hold fallbacks.
    pub error: Option<String>,
    /// Set by the load-status pass when the mod cannot be loaded.
    pub load_error: Option<String>,
    pub side: Option<ModSide>,
    pub required_on_client: Option<bool>,
    pub required_on_server: Option<bool>,
    pub missing_dependencies: Vec<DependencyRecord>,
    pub dependency_has_errors: bool,
}

impl ModDescriptor {
    pub fn from_manifest(
        manifest: ModManifest,
        source_path: Utf8PathBuf,
        source_kind: SourceKind,
        icon: Option<Vec<u8>>,
    ) -> Self {
        Self {
            mod_id: manifest.mod_id,
            name: manifest.name,
            version: manifest.version,
            network_version: manifest.network_version,
            description: manifest.description,
            website: manifest.website,
            authors: manifest.authors,
            contributors: manifest.contributors,
            dependencies: manifest.dependencies,
            source_path,
            source_kind,
            icon,
            error: None,
            load_error: None,
            side: manifest.side,
            required_on_client: manifest.required_on_client,
            required_on_server: manifest.required_on_server,
            missing_dependencies: Vec::new(),
            dependency_has_errors: false,
        }
    }

    /// Descriptor for a source whose metadata could not be read.
    pub fn failed(
        fallback_name: &str,
        source_path: Utf8PathBuf,
        source_kind: SourceKind,
        error: impl Into<String>,
    ) -> Self {
        let manifest = ModManifest {
            mod_id: crate::utils::id::sanitize_mod_id(fallback_name),
            name: fallback_name.to_string(),
            ..Default::default()
        };
        let mut descriptor = Self::from_manifest(manifest, source_path, source_kind, None);
        descriptor.error = Some(error.into());
        descriptor
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Clears everything the load-status pass computes.
    pub fn reset_load_status(&mut self) {
        self.load_error = None;
        self.missing_dependencies.clear();
        self.dependency_has_errors = false;
    }
}
