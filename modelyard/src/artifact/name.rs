//! Artifact archive naming.
//!
//! Valid archives look like `20240101-120000.tar.gz`: an 8-digit date, a
//! 6-digit time, and the fixed packaging suffix.

use regex::Regex;
use std::sync::OnceLock;

/// Packaging suffix shared by every model archive.
pub const MODEL_SUFFIX: &str = ".tar.gz";

/// Returns the compiled archive-name pattern.
///
/// Captures:
/// - Group 1: 8-digit date (`YYYYMMDD`)
/// - Group 2: 6-digit time (`HHMMSS`)
fn archive_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^(\d{8})-(\d{6})\.tar\.gz$").expect("archive pattern is valid")
    })
}

/// True if the file name is a valid model archive name.
pub fn is_model_archive(name: &str) -> bool {
    archive_regex().is_match(name)
}

/// Strips the packaging suffix, yielding the cache directory basename.
///
/// Returns the name unchanged when the suffix is absent.
pub fn model_stem(name: &str) -> &str {
    name.strip_suffix(MODEL_SUFFIX).unwrap_or(name)
}

/// Appends the packaging suffix to a cache directory basename.
pub fn archive_name(stem: &str) -> String {
    format!("{stem}{MODEL_SUFFIX}")
}

/// Numeric ordering key derived from the timestamp digits.
///
/// `20240101-120000.tar.gz` → `20240101120000`. Returns `None` for names
/// that do not match the archive pattern.
pub fn timestamp_key(name: &str) -> Option<u64> {
    let caps = archive_regex().captures(name)?;
    format!("{}{}", &caps[1], &caps[2]).parse().ok()
}
