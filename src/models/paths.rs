use camino::{Utf8Path, Utf8PathBuf};

macro_rules! define_paths {
    ($name:ident { $($field:ident : $default:expr),* $(,)? }) => {
        #[derive(Clone, Debug)]
        pub struct $name {
            $(pub $field: Utf8PathBuf,)*
        }

        impl $name {
            pub fn to_absolute(mut self, base: &Utf8Path) -> Self {
                $(self.$field = base.join(self.$field);)*
                self
            }

            pub fn new(base: &Utf8Path) -> Self {
                Self::default().to_absolute(base)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $($field: $default.into(),)*
                }
            }
        }
    };
}

// Layout of the game's per-user data directory.
define_paths!(DataPathRules {
    mods: "Mods",
    logs: "Logs",
});

// Layout of the game install; its bundled mods are managed by the game itself.
define_paths!(InstallPathRules {
    bundled_mods: "Mods",
});

define_paths!(CachePathRules {
    index: "index.toml",
    entries: "entries",
});

/// File names a mod package is expected to carry.
pub const MANIFEST_FILE: &str = "modinfo.json";
pub const DEFAULT_ICON_FILE: &str = "modicon.png";

/// Log files the game writes its mod search paths into.
pub const LOG_FILE_PREFIXES: [&str; 2] = ["client-main", "server-main"];
