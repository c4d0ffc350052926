use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Hashes a string using Blake3 (16 bytes) and encodes it with base64url (no padding).
/// Returns a stable, compact identifier (~22 characters).
pub fn hash_id(input: &str) -> String {
    let hash = blake3::hash(input.as_bytes());
    let truncated = &hash.as_bytes()[..16];
    URL_SAFE_NO_PAD.encode(truncated)
}

/// Derives a mod id from a display name: lowercase ASCII letters and digits only.
/// A leading digit gets an `m` prefix; an empty result becomes `mod`.
pub fn sanitize_mod_id(name: &str) -> String {
    let id: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    match id.chars().next() {
        None => "mod".to_string(),
        Some(c) if c.is_ascii_digit() => format!("m{id}"),
        Some(_) => id,
    }
}

/// Makes a string safe as a single path segment.
pub fn sanitize_segment(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();
    let trimmed = cleaned.trim_matches('.');
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}
