use regex::Regex;
use semver::{BuildMetadata, Prerelease, Version};
use std::sync::OnceLock;

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[vV]?(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:\.\d+)*(?:-([0-9A-Za-z][0-9A-Za-z.\-]*))?")
            .expect("static version pattern")
    })
}

/// Parses mod versions as they appear in the wild: `1.2` reads as `1.2.0`,
/// a leading `v` and a fourth numeric component are tolerated, and anything
/// after the numeric core other than a `-prerelease` suffix is ignored.
pub fn parse_lenient(value: &str) -> Option<Version> {
    let caps = version_regex().captures(value.trim())?;
    let number = |i: usize| -> Option<u64> {
        caps.get(i).map_or(Some(0), |m| m.as_str().parse().ok())
    };

    let pre = caps
        .get(4)
        .and_then(|m| Prerelease::new(m.as_str()).ok())
        .unwrap_or(Prerelease::EMPTY);

    Some(Version {
        major: number(1)?,
        minor: number(2)?,
        patch: number(3)?,
        pre,
        build: BuildMetadata::EMPTY,
    })
}

/// Whether `available` meets the minimum `required` version.
///
/// An empty or `*` requirement always passes. When either side cannot be
/// parsed the dependency is given the benefit of the doubt.
pub fn satisfies(available: Option<&str>, required: &str) -> bool {
    let required = required.trim();
    if required.is_empty() || required == "*" {
        return true;
    }

    let Some(available) = available else {
        return true;
    };

    match (parse_lenient(available), parse_lenient(required)) {
        (Some(have), Some(need)) => have >= need,
        _ => true,
    }
}
