//! Catalog entry types
//!
//! Display-ready file and folder records, also used as the JSON shape of
//! the listing API.

use serde::Serialize;

/// Extensions rendered as image previews
pub const IMAGE_EXTENSIONS: [&str; 10] = [
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "svg", "ico", "tiff", "tif",
];

/// A file as shown in a folder listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub name: String,
    #[serde(skip)]
    pub path: String,
    pub size: u64,
    /// Modification time in seconds since the epoch
    pub modified: u64,
    pub extension: String,
    pub is_image: bool,
}

/// A folder as shown in a folder listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderEntry {
    pub name: String,
    pub path: String,
    pub modified: u64,
}

/// Children of one folder, split into folders and files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    /// Normalized relative path of the listed folder ("" for the root)
    pub current_path: String,
    pub folders: Vec<FolderEntry>,
    pub files: Vec<FileEntry>,
}

impl Catalog {
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.files.is_empty()
    }
}
