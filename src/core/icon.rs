use crate::models::cache_dto::FileStamp;
use crate::models::paths::DEFAULT_ICON_FILE;
use camino::{Utf8Path, Utf8PathBuf};

/// Cleans a manifest-declared relative path. Returns `None` for absolute
/// paths, drive-prefixed paths and anything that climbs out with `..`.
pub fn sanitize_relative(declared: &str) -> Option<String> {
    let unified = declared.trim().replace('\\', "/");
    if unified.starts_with('/') || unified.contains(':') {
        return None;
    }

    let mut parts = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            s => parts.push(s),
        }
    }

    (!parts.is_empty()).then(|| parts.join("/"))
}

/// One icon location that was checked, with what was found there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IconProbe {
    pub path: Utf8PathBuf,
    pub stamp: Option<FileStamp>,
}

impl IconProbe {
    pub fn is_current(&self) -> bool {
        FileStamp::read(&self.path) == self.stamp
    }
}

#[derive(Clone, Debug, Default)]
pub struct ResolvedIcon {
    pub bytes: Option<Vec<u8>>,
    /// Every location checked, in order, up to and including the hit.
    pub probes: Vec<IconProbe>,
}

/// Resolves the icon for a mod folder: declared path, then the default file
/// name, then `fallback`.
pub fn resolve_folder_icon(
    dir: &Utf8Path,
    declared: Option<&str>,
    fallback: Option<&[u8]>,
) -> ResolvedIcon {
    let candidates = declared
        .and_then(sanitize_relative)
        .into_iter()
        .chain(std::iter::once(DEFAULT_ICON_FILE.to_string()));

    let mut resolved = ResolvedIcon::default();
    for candidate in candidates {
        let path = dir.join(candidate);
        if resolved.probes.iter().any(|p| p.path == path) {
            continue;
        }

        let stamp = FileStamp::read(&path);
        resolved.probes.push(IconProbe {
            path: path.clone(),
            stamp,
        });

        if stamp.is_none() {
            continue;
        }
        if let Ok(bytes) = std::fs::read(&path) {
            resolved.bytes = Some(bytes);
            return resolved;
        }
    }

    resolved.bytes = fallback.map(<[u8]>::to_vec);
    resolved
}
