use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Cap on the sanitized stem, before the uniqueness suffix
pub const MAX_STEM_LENGTH: usize = 100;

/// Cap on the sanitized extension, including the dot
const MAX_EXTENSION_LENGTH: usize = 16;

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("Invalid filename character regex"));

/// Derive a storage-safe, collision-resistant name from an untrusted file name.
///
/// `../../etc/passwd.png` at `t` becomes `etcpasswd_<t millis>.png`.
pub fn sanitize_file_name(name: &str, now: DateTime<Utc>) -> String {
    let mut cleaned: String = name.replace(['/', '\\', '\0'], "");
    while cleaned.contains("..") {
        cleaned = cleaned.replace("..", "");
    }
    let cleaned = cleaned.trim_start_matches('.');
    let cleaned = UNSAFE_CHARS.replace_all(cleaned, "_");

    let (stem, extension) = match cleaned.rfind('.') {
        Some(dot) if dot > 0 && cleaned.len() - dot <= MAX_EXTENSION_LENGTH => {
            (&cleaned[..dot], &cleaned[dot..])
        }
        _ => (cleaned.as_ref(), ""),
    };

    // Only ASCII survives UNSAFE_CHARS, so byte truncation is char-safe
    let stem = &stem[..stem.len().min(MAX_STEM_LENGTH)];
    let stem = if stem.is_empty() { "file" } else { stem };

    format!(
        "{}_{}{}",
        stem,
        now.timestamp_millis(),
        extension.to_lowercase()
    )
}
