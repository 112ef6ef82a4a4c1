//! File system storage management
//!
//! Every operation resolves its path against a single storage root and
//! refuses anything that would land outside of it.

pub mod filesystem;
pub mod operations;
pub mod results;
pub mod validation;

pub use operations::Storage;
pub use results::{ItemKind, OpenedFile, StoredItem};
pub use validation::{normalize_relative_path, sanitize_filename};
