use crate::config::ModSearchSettings;
use crate::models::descriptor::SourceKind;
use crate::models::paths::{DataPathRules, InstallPathRules, LOG_FILE_PREFIXES};
use crate::models::source::SourceListing;
use crate::utils::file::FileUtils;
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::SystemTime;
use tracing::debug;
use walkdir::WalkDir;

/// Line after which the game lists the directories it searches for mods.
pub const SEARCH_PATHS_SENTINEL: &str = "Will search the following paths for mods:";
/// Suffix the game appends to listed directories that do not exist.
pub const NOT_FOUND_SUFFIX: &str = "(Not found?)";

fn log_prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[\d.:/\- ]*\[[A-Za-z]+\]\s*").expect("static log prefix pattern")
    })
}

/// Pulls the mod search directories out of a game log.
///
/// Starts after the first line containing [`SEARCH_PATHS_SENTINEL`] and stops
/// at the first blank line or line that does not look like a path.
pub fn extract_log_paths(log: &str) -> Vec<String> {
    let mut lines = log.lines().skip_while(|l| !l.contains(SEARCH_PATHS_SENTINEL));
    if lines.next().is_none() {
        return Vec::new();
    }

    lines
        .map(|line| log_prefix_regex().replace(line.trim(), "").trim().to_string())
        .take_while(|line| !line.is_empty() && FileUtils::looks_like_path(line))
        .map(|line| {
            line.strip_suffix(NOT_FOUND_SUFFIX)
                .map(|p| p.trim_end().to_string())
                .unwrap_or(line)
        })
        .collect()
}

/// Most recently written game log in `logs_dir`.
pub fn latest_log_file(logs_dir: &Utf8Path) -> Option<Utf8PathBuf> {
    logs_dir
        .read_dir_utf8()
        .ok()?
        .filter_map(|e| e.ok())
        .filter(|e| {
            let name = e.file_name().to_ascii_lowercase();
            name.ends_with(".txt") && LOG_FILE_PREFIXES.iter().any(|p| name.starts_with(p))
        })
        .filter_map(|e| {
            let modified = e.metadata().ok()?.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            Some((modified, e.path().to_path_buf()))
        })
        .max_by_key(|(modified, _)| *modified)
        .map(|(_, path)| path)
}

/// Builds the ordered, deduplicated list of sources to examine.
pub struct SourceCollector<'a, S: ModSearchSettings + ?Sized> {
    settings: &'a S,
}

impl<'a, S: ModSearchSettings + ?Sized> SourceCollector<'a, S> {
    pub fn new(settings: &'a S) -> Self {
        Self { settings }
    }

    /// Search roots in precedence order: the data directory's mod folder,
    /// configured extra paths, then paths the game reported in its log.
    /// The game's bundled mod folder is never included.
    pub fn search_roots(&self) -> Vec<Utf8PathBuf> {
        let data_dir = self.settings.data_directory();
        let data_paths = DataPathRules::new(&data_dir);

        let extra = self
            .settings
            .extra_mod_paths()
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .map(|p| self.resolve_configured(&data_dir, p.trim()));

        let from_log = latest_log_file(&data_paths.logs)
            .and_then(|log| std::fs::read_to_string(log).ok())
            .map(|text| extract_log_paths(&text))
            .unwrap_or_default()
            .into_iter()
            .map(Utf8PathBuf::from);

        let excluded: HashSet<String> = self
            .settings
            .install_directory()
            .map(|install| InstallPathRules::new(&install).bundled_mods)
            .into_iter()
            .map(|p| FileUtils::identity_key(&FileUtils::normalize(&p)))
            .collect();

        let mut seen = HashSet::new();
        std::iter::once(data_paths.mods)
            .chain(extra)
            .chain(from_log)
            .map(|p| FileUtils::normalize(&p))
            .filter(|p| {
                let key = FileUtils::identity_key(p);
                !excluded.contains(&key) && seen.insert(key)
            })
            .collect()
    }

    /// Relative configured paths resolve against the first search base that
    /// contains them, else against the data directory.
    fn resolve_configured(&self, data_dir: &Utf8Path, configured: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::from(configured);
        if path.is_absolute() {
            return path;
        }

        self.settings
            .search_base_candidates()
            .into_iter()
            .map(|base| base.join(&path))
            .find(|candidate| candidate.exists())
            .unwrap_or_else(|| data_dir.join(&path))
    }

    pub fn collect(&self) -> SourceListing {
        let mut listing = SourceListing::new();

        for root in self.search_roots() {
            if !root.is_dir() {
                debug!(root = %root, "Skipping missing search root");
                continue;
            }

            let entries = WalkDir::new(&root)
                .min_depth(1)
                .max_depth(1)
                .sort_by(|a, b| {
                    a.file_name()
                        .to_string_lossy()
                        .to_lowercase()
                        .cmp(&b.file_name().to_string_lossy().to_lowercase())
                })
                .into_iter()
                // Unreadable roots and entries are skipped.
                .filter_map(|e| e.ok());

            for entry in entries {
                let Ok(path) = Utf8PathBuf::from_path_buf(entry.path().to_path_buf()) else {
                    continue;
                };

                let kind = if entry.path().is_dir() {
                    Some(SourceKind::Folder)
                } else {
                    path.file_name().and_then(SourceKind::from_file_name)
                };

                if let Some(kind) = kind {
                    listing.push(path, kind);
                }
            }
        }

        debug!(sources = listing.len(), "Collected mod sources");
        listing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_paths_between_sentinel_and_first_non_path() {
        let log = "\
12.1.2025 10:00:00 [Notification] Game Version: v1.21.0
12.1.2025 10:00:00 [Notification] Will search the following paths for mods:
12.1.2025 10:00:00 [Notification]     /opt/game/Mods
12.1.2025 10:00:00 [Notification]     /home/me/.config/GameData/Mods (Not found?)
     C:\\Users\\me\\Mods
12.1.2025 10:00:00 [Notification] Found 3 mods
/not/collected
";
        assert_eq!(
            extract_log_paths(log),
            vec![
                "/opt/game/Mods",
                "/home/me/.config/GameData/Mods",
                "C:\\Users\\me\\Mods"
            ]
        );
    }

    #[test]
    fn blank_line_ends_the_list() {
        let log = "Will search the following paths for mods:\n/a/Mods\n\n/b/Mods\n";
        assert_eq!(extract_log_paths(log), vec!["/a/Mods"]);
    }

    #[test]
    fn no_sentinel_no_paths() {
        assert!(extract_log_paths("/a/Mods\n/b/Mods\n").is_empty());
    }
}
