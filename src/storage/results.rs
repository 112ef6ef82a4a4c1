//! Storage result types
//!
//! Defines the structures returned by storage operations.

use std::time::SystemTime;
use tokio::fs::File;

/// Whether a stored item is a file or a folder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    File { size: u64 },
    Folder,
}

/// A file or folder under the storage root
#[derive(Debug, Clone)]
pub struct StoredItem {
    pub name: String,
    /// Slash-separated path relative to the storage root
    pub relative_path: String,
    pub modified: SystemTime,
    pub kind: ItemKind,
}

/// An open file ready to be streamed to a client
#[derive(Debug)]
pub struct OpenedFile {
    pub file: File,
    pub name: String,
    pub relative_path: String,
    pub size: u64,
    pub modified: SystemTime,
}
