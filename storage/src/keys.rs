//! Object keys for the documents one digest run produces.

use digest_core::dates::parse_date_key;
use digest_core::{CoreError, StorageError};

pub const DATA_PREFIX: &str = "data/";
pub const REPORTS_PREFIX: &str = "reports/";

const ALL_POSTS_PREFIX: &str = "data/all_posts_";
const FILTERED_POSTS_PREFIX: &str = "data/posts_";
const DIGEST_PREFIX: &str = "reports/digest_";

/// Appended to a file name while its contents are being written.
pub(crate) const STAGING_SUFFIX: &str = ".partial";

pub fn all_posts(date: &str) -> String {
    format!("{ALL_POSTS_PREFIX}{date}.json")
}

pub fn filtered_posts(date: &str) -> String {
    format!("{FILTERED_POSTS_PREFIX}{date}.json")
}

pub fn digest(date: &str) -> String {
    format!("{DIGEST_PREFIX}{date}.md")
}

pub fn filtered_posts_prefix() -> &'static str {
    FILTERED_POSTS_PREFIX
}

pub fn digest_prefix() -> &'static str {
    DIGEST_PREFIX
}

/// The `YYYY-MM-DD` date of a digest key, if `key` is one.
pub fn digest_date(key: &str) -> Option<&str> {
    dated(key, DIGEST_PREFIX, ".md")
}

/// The `YYYY-MM-DD` date of a filtered-posts key, if `key` is one.
pub fn filtered_posts_date(key: &str) -> Option<&str> {
    dated(key, FILTERED_POSTS_PREFIX, ".json")
}

fn dated<'k>(key: &'k str, prefix: &str, suffix: &str) -> Option<&'k str> {
    let date = key.strip_prefix(prefix)?.strip_suffix(suffix)?;
    parse_date_key(date).ok().map(|_| date)
}

/// Rejects keys that could escape a storage root or clash with a staging file.
pub fn validate(key: &str) -> Result<(), CoreError> {
    let invalid = key.is_empty()
        || key.ends_with(STAGING_SUFFIX)
        || key.starts_with('/')
        || key.contains('\\')
        || key.contains(':')
        || key.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..");

    if invalid {
        return Err(CoreError::Storage(StorageError::InvalidKey {
            key: key.to_string(),
        }));
    }
    Ok(())
}
