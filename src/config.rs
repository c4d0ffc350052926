pub mod global;

use camino::Utf8PathBuf;

pub const APP_NAME: &str = "modlist_keeper";

/// Where to look for mods. Supplied by the settings/profile layer.
pub trait ModSearchSettings {
    /// The game's per-user data directory (holds `Mods/` and `Logs/`).
    fn data_directory(&self) -> Utf8PathBuf;

    /// The game install; its bundled mod folder is excluded from scans.
    fn install_directory(&self) -> Option<Utf8PathBuf>;

    /// Extra search paths as configured, possibly relative.
    fn extra_mod_paths(&self) -> Vec<String>;

    /// Bases that relative extra paths are resolved against, in order.
    fn search_base_candidates(&self) -> Vec<Utf8PathBuf>;
}

/// User-disabled mods, consulted when judging dependency providers.
pub trait DisabledMods {
    fn is_disabled(&self, mod_id: &str, version: Option<&str>) -> bool;
}

impl<F> DisabledMods for F
where
    F: Fn(&str, Option<&str>) -> bool,
{
    fn is_disabled(&self, mod_id: &str, version: Option<&str>) -> bool {
        self(mod_id, version)
    }
}
