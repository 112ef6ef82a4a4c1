//! Path validation
//!
//! Lexical path normalization, root-escape detection and filename
//! sanitization. Everything here is pure and does not touch the disk.

use crate::error::StorageError;

/// Top-level names taken by the web routes; a root folder with one of these
/// names would be shadowed by the route.
pub const RESERVED_ROOT_NAMES: [&str; 9] = [
    "api",
    "create_folder",
    "delete",
    "download",
    "login",
    "logout",
    "rename",
    "upload",
    "view",
];

/// Normalize a user-supplied relative path into slash-separated form.
///
/// Empty and `.` segments are dropped and `..` pops the previous segment.
/// A `..` that would climb above the root is rejected with `PathEscape`,
/// as is any segment containing a NUL byte.
pub fn normalize_relative_path(raw: &str) -> Result<String, StorageError> {
    let mut segments: Vec<&str> = Vec::new();

    for segment in raw.split(['/', '\\']) {
        match segment {
            "" | "." => continue,
            ".." => {
                if segments.pop().is_none() {
                    return Err(StorageError::PathEscape(raw.to_string()));
                }
            }
            s if s.contains('\0') => return Err(StorageError::PathEscape(raw.to_string())),
            s => segments.push(s),
        }
    }

    Ok(segments.join("/"))
}

/// Join a normalized relative directory and a child name
pub fn join_relative(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Parent of a normalized relative path ("" for top-level entries)
pub fn parent_relative(path: &str) -> &str {
    path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
}

/// Sanitize a filename for use on disk.
///
/// Separators become whitespace, whitespace runs collapse to `_`, only
/// ASCII letters, digits, `_`, `.` and `-` survive, and leading/trailing
/// `.`/`_` are stripped. May return an empty string.
pub fn sanitize_filename(filename: &str) -> String {
    let spaced: String = filename
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Whether a folder named `name` directly under `parent` would collide with a route
pub fn is_reserved_folder(parent: &str, name: &str) -> bool {
    parent.is_empty() && RESERVED_ROOT_NAMES.contains(&name)
}

/// Split a name into stem and extension (extension keeps its leading dot)
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}
