//! Catalog builder
//!
//! Turns a raw storage listing into the sorted, enriched catalog.

use crate::catalog::entries::{Catalog, FileEntry, FolderEntry, IMAGE_EXTENSIONS};
use crate::error::StorageError;
use crate::storage::filesystem::epoch_seconds;
use crate::storage::{ItemKind, Storage, StoredItem, normalize_relative_path};

/// Lowercased text after the last dot, empty when there is none
pub fn file_extension(name: &str) -> String {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

pub fn is_image_extension(extension: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&extension)
}

/// Partitions `items` into folders and files, newest first.
///
/// The sort is stable, so entries with equal modification times keep the
/// order in which the directory was enumerated.
pub fn build_catalog(current_path: &str, mut items: Vec<StoredItem>) -> Catalog {
    items.sort_by(|a, b| b.modified.cmp(&a.modified));

    let mut catalog = Catalog {
        current_path: current_path.to_string(),
        ..Catalog::default()
    };

    for item in items {
        let modified = epoch_seconds(item.modified);
        match item.kind {
            ItemKind::Folder => catalog.folders.push(FolderEntry {
                name: item.name,
                path: item.relative_path,
                modified,
            }),
            ItemKind::File { size } => {
                let extension = file_extension(&item.name);
                catalog.files.push(FileEntry {
                    is_image: is_image_extension(&extension),
                    extension,
                    name: item.name,
                    path: item.relative_path,
                    size,
                    modified,
                });
            }
        }
    }

    catalog
}

/// Lists `relative_dir` through the storage adapter and builds its catalog
pub async fn load_catalog(storage: &Storage, relative_dir: &str) -> Result<Catalog, StorageError> {
    let current_path = normalize_relative_path(relative_dir)?;
    let items = storage.list_children(&current_path).await?;
    Ok(build_catalog(&current_path, items))
}
