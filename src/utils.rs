//! Utility functions for text normalization, URL id extraction, and file
//! system preflight checks.
//!
//! The text helpers implement the normalization rules every extractor relies
//! on: whitespace collapsing, the `--`/`null` unset sentinels, and pulling the
//! stable identifier out of an entity URL's last path segment.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Clean and normalize a text fragment extracted from markup.
///
/// Collapses newlines, tabs and runs of spaces into single spaces and trims
/// the ends. Returns an empty string for empty input.
pub fn clean_text(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").to_string()
}

/// Extract the entity id from a stats URL.
///
/// Every entity page is addressed as `<entity_base>/<id>`, so the id is the
/// last non-empty path segment.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(extract_id_from_url("http://ufcstats.com/fighter-details/abc123"), "abc123");
/// ```
pub fn extract_id_from_url(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("")
        .to_string()
}

/// Normalize a raw field value, mapping the source's placeholder markers to
/// "unset".
///
/// Returns `None` for empty values and for the `--`, `null` and `None`
/// sentinels the source uses where a measurement is unknown.
pub fn normalize_field(value: &str) -> Option<String> {
    let cleaned = clean_text(value);
    match cleaned.as_str() {
        "" | "--" | "null" | "None" => None,
        _ => Some(cleaned),
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable
/// (permission denied, read-only filesystem, etc.).
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  Jon \n\t Jones  "), "Jon Jones");
        assert_eq!(clean_text("KO/TKO"), "KO/TKO");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn test_extract_id_from_url() {
        assert_eq!(
            extract_id_from_url("http://ufcstats.com/fighter-details/abc123"),
            "abc123"
        );
        assert_eq!(
            extract_id_from_url("http://ufcstats.com/event-details/xyz/"),
            "xyz"
        );
        assert_eq!(extract_id_from_url(""), "");
    }

    #[test]
    fn test_normalize_field_sentinels() {
        assert_eq!(normalize_field("--"), None);
        assert_eq!(normalize_field("null"), None);
        assert_eq!(normalize_field("None"), None);
        assert_eq!(normalize_field("   "), None);
        assert_eq!(normalize_field(" 5' 11\" "), Some("5' 11\"".to_string()));
    }
}
