use crate::models::error::ModError;
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::io::Write;
use std::sync::OnceLock;

pub struct FileUtils;

impl FileUtils {
    /// Absolute, canonical form of a path when it exists; otherwise the path
    /// made absolute against the current directory.
    pub fn normalize(path: &Utf8Path) -> Utf8PathBuf {
        if let Ok(canonical) = dunce::canonicalize(path) {
            if let Ok(p) = Utf8PathBuf::from_path_buf(canonical) {
                return p;
            }
        }

        if path.is_absolute() {
            return path.to_path_buf();
        }

        std::env::current_dir()
            .ok()
            .and_then(|cwd| Utf8PathBuf::from_path_buf(cwd).ok())
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|| path.to_path_buf())
    }

    /// Key used for case-insensitive path identity.
    pub fn identity_key(path: &Utf8Path) -> String {
        path.as_str().replace('\\', "/").to_lowercase()
    }

    /// Whether a line of text looks like a filesystem path: it has a separator
    /// or starts with a drive letter.
    pub fn looks_like_path(line: &str) -> bool {
        static DRIVE: OnceLock<Regex> = OnceLock::new();
        let drive = DRIVE.get_or_init(|| Regex::new(r"^[A-Za-z]:").expect("static drive pattern"));
        let line = line.trim();
        !line.is_empty() && (line.contains('/') || line.contains('\\') || drive.is_match(line))
    }

    /// Finds a file directly inside `dir` whose name matches case-insensitively.
    pub fn find_file_ignore_case(dir: &Utf8Path, name: &str) -> Option<Utf8PathBuf> {
        let exact = dir.join(name);
        if exact.is_file() {
            return Some(exact);
        }

        dir.read_dir_utf8()
            .ok()?
            .filter_map(|e| e.ok())
            .find(|e| e.file_name().eq_ignore_ascii_case(name) && e.path().is_file())
            .map(|e| e.path().to_path_buf())
    }

    /// Writes through a uniquely named temp file and renames it into place so
    /// readers never observe a half-written file.
    pub fn write_atomic(path: &Utf8Path, data: &[u8]) -> Result<(), ModError> {
        let parent = path
            .parent()
            .ok_or_else(|| ModError::InvalidPath(path.to_string()))?;
        std::fs::create_dir_all(parent)?;

        let tmp = parent.join(format!(
            ".{}.{}.tmp",
            path.file_name().unwrap_or("file"),
            uuid::Uuid::new_v4()
        ));

        let result = std::fs::File::create(&tmp)
            .and_then(|mut f| f.write_all(data).and_then(|_| f.sync_all()))
            .and_then(|_| std::fs::rename(&tmp, path));

        if let Err(e) = result {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_like_lines() {
        assert!(FileUtils::looks_like_path("/home/me/.config/Game/Mods"));
        assert!(FileUtils::looks_like_path(r"C:\Games\Mods"));
        assert!(FileUtils::looks_like_path("D:"));
        assert!(!FileUtils::looks_like_path("Loaded 12 mods"));
        assert!(!FileUtils::looks_like_path("   "));
    }

    #[test]
    fn identity_key_folds_case_and_separators() {
        assert_eq!(
            FileUtils::identity_key(Utf8Path::new(r"C:\Mods\A.zip")),
            FileUtils::identity_key(Utf8Path::new("c:/mods/a.ZIP"))
        );
    }

    #[test]
    fn write_atomic_replaces_content() {
        let tmp = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(tmp.path()).unwrap();
        let target = root.join("nested/out.txt");

        FileUtils::write_atomic(&target, b"one").unwrap();
        FileUtils::write_atomic(&target, b"two").unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "two");
        assert_eq!(std::fs::read_dir(target.parent().unwrap()).unwrap().count(), 1);
    }
}
