//! Folder catalog
//!
//! Builds the file/folder view of a single directory.

pub mod builder;
pub mod entries;

pub use builder::{build_catalog, load_catalog};
pub use entries::{Catalog, FileEntry, FolderEntry};
