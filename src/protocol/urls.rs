//! URL helpers
//!
//! Builds percent-encoded links and redirect targets for relative paths.

use crate::storage::normalize_relative_path;
use crate::storage::validation::parent_relative;

/// Percent-encodes each segment of a relative path, keeping the slashes
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Catalog view URL for a folder. Invalid paths fall back to the root.
pub fn folder_url(path: &str) -> String {
    match normalize_relative_path(path) {
        Ok(normalized) if !normalized.is_empty() => format!("/{}", encode_path(&normalized)),
        _ => "/".to_string(),
    }
}

/// Catalog view URL for the folder containing `item_path`
pub fn parent_folder_url(item_path: &str) -> String {
    match normalize_relative_path(item_path) {
        Ok(normalized) => folder_url(parent_relative(&normalized)),
        Err(_) => "/".to_string(),
    }
}

/// URL for an item action such as `download` or `rename`
pub fn action_url(action: &str, item_path: &str) -> String {
    format!("/{}/{}", action, encode_path(item_path))
}
