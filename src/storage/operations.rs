//! Storage operations
//!
//! Handles the file system operations behind the web routes: list, create
//! folder, upload, delete, rename and read.

use log::{error, info, warn};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use crate::error::StorageError;
use crate::storage::filesystem::{directory_is_empty, modified_time, path_exists};
use crate::storage::results::{ItemKind, OpenedFile, StoredItem};
use crate::storage::validation::{
    is_reserved_folder, join_relative, normalize_relative_path, parent_relative, sanitize_filename,
    split_extension,
};

const MAX_RETRIES: u32 = 3;
const BUFFER_SIZE: usize = 64 * 1024;

/// Filesystem adapter rooted at a single storage directory
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
    max_upload_bytes: u64,
}

impl Storage {
    /// Opens the storage root, creating it if needed.
    pub fn open(root: impl Into<PathBuf>, max_upload_bytes: u64) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        let root = root.canonicalize()?;

        Ok(Self {
            root,
            max_upload_bytes,
        })
    }

    /// Absolute, canonical storage root
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Resolves a relative path to a real path under the root.
    ///
    /// Returns the real path together with the normalized relative path.
    /// Symlinks are followed for the deepest existing ancestor, so a link
    /// pointing outside the root is rejected too.
    async fn resolve(&self, relative: &str) -> Result<(PathBuf, String), StorageError> {
        let virtual_path = normalize_relative_path(relative)?;
        let real_path = self.root.join(&virtual_path);

        let mut probe = real_path.as_path();
        loop {
            match fs::canonicalize(probe).await {
                Ok(canonical) => {
                    if canonical.starts_with(&self.root) {
                        break;
                    }
                    warn!(
                        "Rejected path {} resolving outside root: {}",
                        relative,
                        canonical.display()
                    );
                    return Err(StorageError::PathEscape(relative.to_string()));
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => match probe.parent() {
                    Some(parent) => probe = parent,
                    None => return Err(StorageError::PathEscape(relative.to_string())),
                },
                Err(e) => return Err(StorageError::from(e)),
            }
        }

        Ok((real_path, virtual_path))
    }

    /// Like `resolve`, but refuses the storage root itself
    async fn resolve_item(&self, relative: &str) -> Result<(PathBuf, String), StorageError> {
        let (real_path, virtual_path) = self.resolve(relative).await?;
        if virtual_path.is_empty() {
            return Err(StorageError::PathEscape(relative.to_string()));
        }
        Ok((real_path, virtual_path))
    }

    /// Lists the immediate children of a directory
    pub async fn list_children(&self, relative_dir: &str) -> Result<Vec<StoredItem>, StorageError> {
        let (real_path, virtual_path) = self.resolve(relative_dir).await?;

        match fs::metadata(&real_path).await {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => return Err(StorageError::NotFound(virtual_path)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(virtual_path));
            }
            Err(e) => return Err(StorageError::from(e)),
        }

        let mut entries = fs::read_dir(&real_path).await?;
        let mut items = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();

            // Follows symlinks, like a plain stat would
            let metadata = match fs::metadata(entry.path()).await {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!("Skipping {} in {}: {}", name, real_path.display(), e);
                    continue;
                }
            };

            let kind = if metadata.is_dir() {
                ItemKind::Folder
            } else if metadata.is_file() {
                ItemKind::File {
                    size: metadata.len(),
                }
            } else {
                continue;
            };

            items.push(StoredItem {
                relative_path: join_relative(&virtual_path, &name),
                name,
                modified: modified_time(&metadata),
                kind,
            });
        }

        info!(
            "Listed directory /{} (real: {}) - {} entries",
            virtual_path,
            real_path.display(),
            items.len()
        );

        Ok(items)
    }

    /// Creates a folder named `name` inside `relative_dir`.
    ///
    /// Returns the relative path of the new folder.
    pub async fn create_folder(
        &self,
        relative_dir: &str,
        name: &str,
    ) -> Result<String, StorageError> {
        let folder_name = sanitize_filename(name);
        if folder_name.is_empty() {
            return Err(StorageError::InvalidName(name.to_string()));
        }

        let (parent_path, virtual_parent) = self.resolve(relative_dir).await?;
        if is_reserved_folder(&virtual_parent, &folder_name) {
            warn!("Refused folder name /{} (taken by a route)", folder_name);
            return Err(StorageError::InvalidName(folder_name));
        }

        let folder_path = parent_path.join(&folder_name);
        let virtual_folder = join_relative(&virtual_parent, &folder_name);

        if path_exists(&folder_path).await? {
            return Err(StorageError::AlreadyExists(virtual_folder));
        }

        fs::create_dir_all(&folder_path).await?;

        info!(
            "Created folder /{} (real: {})",
            virtual_folder,
            folder_path.display()
        );

        Ok(virtual_folder)
    }

    /// Stores an uploaded byte stream inside `relative_dir`.
    ///
    /// The name is sanitized (falling back to `file_<8 hex>`), and a taken
    /// name gets `_1`, `_2`, ... inserted before the extension. Each
    /// candidate is claimed with an exclusive create, so concurrent uploads
    /// never share a name. Folders created for the upload are removed again
    /// if it fails. Returns the stored file name.
    pub async fn save_upload<R>(
        &self,
        relative_dir: &str,
        desired_name: &str,
        reader: R,
    ) -> Result<String, StorageError>
    where
        R: AsyncRead,
    {
        let mut file_name = sanitize_filename(desired_name);
        if file_name.is_empty() {
            file_name = fallback_file_name();
        }

        let (dir_path, virtual_dir) = self.resolve(relative_dir).await?;

        let created_dirs = missing_directories(&self.root, &dir_path).await?;
        if let Some(top) = created_dirs.last() {
            let top_name = virtual_dir.split('/').next().unwrap_or_default();
            if top.parent() == Some(self.root.as_path()) && is_reserved_folder("", top_name) {
                warn!("Refused upload into /{} (taken by a route)", virtual_dir);
                return Err(StorageError::InvalidName(top_name.to_string()));
            }
        }

        let result = self
            .store_stream(&dir_path, &virtual_dir, desired_name, &file_name, reader)
            .await;
        if result.is_err() {
            remove_directories(&created_dirs).await;
        }
        result
    }

    /// Creates `dir_path` if needed and writes the stream under a unique name.
    /// A partially written file is removed on failure.
    async fn store_stream<R>(
        &self,
        dir_path: &Path,
        virtual_dir: &str,
        desired_name: &str,
        file_name: &str,
        reader: R,
    ) -> Result<String, StorageError>
    where
        R: AsyncRead,
    {
        fs::create_dir_all(dir_path).await?;

        let (stored_name, mut file) = claim_unique_name(dir_path, file_name).await?;
        let file_path = dir_path.join(&stored_name);

        info!(
            "Receiving upload {:?} as /{} (real: {})",
            desired_name,
            join_relative(virtual_dir, &stored_name),
            file_path.display()
        );

        let reader = std::pin::pin!(reader);
        match self.write_limited(reader, &mut file).await {
            Ok(total_bytes) => {
                info!(
                    "Upload completed: /{} ({} bytes)",
                    join_relative(virtual_dir, &stored_name),
                    total_bytes
                );
                Ok(stored_name)
            }
            Err(e) => {
                drop(file);
                if let Err(remove_err) = fs::remove_file(&file_path).await {
                    error!(
                        "Failed to clean up partial upload {}: {}",
                        file_path.display(),
                        remove_err
                    );
                }
                Err(e)
            }
        }
    }

    /// Copies the stream into `file`, refusing to write past the upload limit
    async fn write_limited<R>(
        &self,
        mut reader: std::pin::Pin<&mut R>,
        file: &mut File,
    ) -> Result<u64, StorageError>
    where
        R: AsyncRead,
    {
        let mut buffer = vec![0u8; BUFFER_SIZE];
        let mut total_bytes = 0u64;

        loop {
            let n = match reader.read(&mut buffer).await {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::FileTooLarge => {
                    return Err(StorageError::PayloadTooLarge(self.max_upload_bytes));
                }
                Err(e) => return Err(StorageError::from(e)),
            };

            if n == 0 {
                break;
            }

            // Check size limit BEFORE writing
            total_bytes += n as u64;
            if total_bytes > self.max_upload_bytes {
                error!(
                    "Upload size limit exceeded: {} bytes > {} bytes",
                    total_bytes, self.max_upload_bytes
                );
                return Err(StorageError::PayloadTooLarge(self.max_upload_bytes));
            }

            file.write_all(&buffer[..n]).await?;
        }

        file.flush().await?;
        Ok(total_bytes)
    }

    /// Deletes a file or an empty folder.
    ///
    /// Returns the kind of the removed item.
    pub async fn delete_item(&self, relative_path: &str) -> Result<ItemKind, StorageError> {
        let (real_path, virtual_path) = self.resolve_item(relative_path).await?;

        let metadata = match fs::metadata(&real_path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(virtual_path));
            }
            Err(e) => return Err(StorageError::from(e)),
        };

        let kind = if metadata.is_dir() {
            if !directory_is_empty(&real_path).await? {
                return Err(StorageError::NotEmpty(virtual_path));
            }
            ItemKind::Folder
        } else {
            ItemKind::File {
                size: metadata.len(),
            }
        };

        // Retry transient permission failures (e.g. a scanner holding the file)
        for attempt in 1..=MAX_RETRIES {
            let result = match kind {
                ItemKind::Folder => fs::remove_dir(&real_path).await,
                ItemKind::File { .. } => fs::remove_file(&real_path).await,
            };

            match result {
                Ok(()) => {
                    info!(
                        "Deleted /{} (real: {})",
                        virtual_path,
                        real_path.display()
                    );
                    return Ok(kind);
                }
                Err(e)
                    if attempt < MAX_RETRIES && e.kind() == io::ErrorKind::PermissionDenied =>
                {
                    tokio::time::sleep(Duration::from_millis(100 * attempt as u64)).await;
                }
                Err(e) if e.kind() == io::ErrorKind::DirectoryNotEmpty => {
                    return Err(StorageError::NotEmpty(virtual_path));
                }
                Err(e) => {
                    error!(
                        "Failed to delete /{} (real: {}): {}",
                        virtual_path,
                        real_path.display(),
                        e
                    );
                    return Err(StorageError::from(e));
                }
            }
        }

        Err(StorageError::IoError(io::Error::other(
            "Failed to delete after retries",
        )))
    }

    /// Renames a file or folder within its parent directory.
    ///
    /// Returns the new relative path.
    pub async fn rename_item(
        &self,
        relative_path: &str,
        new_name: &str,
    ) -> Result<String, StorageError> {
        let safe_name = sanitize_filename(new_name);
        if safe_name.is_empty() {
            return Err(StorageError::InvalidName(new_name.to_string()));
        }

        let (source_path, virtual_source) = self.resolve_item(relative_path).await?;
        if !path_exists(&source_path).await? {
            return Err(StorageError::NotFound(virtual_source));
        }

        let parent_path = source_path
            .parent()
            .ok_or_else(|| StorageError::PathEscape(relative_path.to_string()))?;
        let target_path = parent_path.join(&safe_name);
        let virtual_target = join_relative(parent_relative(&virtual_source), &safe_name);

        if target_path == source_path {
            return Ok(virtual_target);
        }

        let source_is_dir = fs::metadata(&source_path)
            .await
            .map(|metadata| metadata.is_dir())
            .unwrap_or(false);
        if source_is_dir && is_reserved_folder(parent_relative(&virtual_source), &safe_name) {
            warn!("Refused renaming /{} to a route name", virtual_source);
            return Err(StorageError::InvalidName(safe_name));
        }

        if path_exists(&target_path).await? {
            return Err(StorageError::AlreadyExists(virtual_target));
        }

        fs::rename(&source_path, &target_path).await?;

        info!(
            "Renamed /{} to /{} (real: {})",
            virtual_source,
            virtual_target,
            target_path.display()
        );

        Ok(virtual_target)
    }

    /// Opens a regular file for streaming
    pub async fn read_file(&self, relative_path: &str) -> Result<OpenedFile, StorageError> {
        let (real_path, virtual_path) = self.resolve_item(relative_path).await?;

        let metadata = match fs::metadata(&real_path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Err(StorageError::NotFound(virtual_path)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(virtual_path));
            }
            Err(e) => return Err(StorageError::from(e)),
        };

        let file = File::open(&real_path).await?;
        let name = virtual_path
            .rsplit('/')
            .next()
            .unwrap_or(virtual_path.as_str())
            .to_string();

        info!(
            "Opened /{} for reading (real: {}, {} bytes)",
            virtual_path,
            real_path.display(),
            metadata.len()
        );

        Ok(OpenedFile {
            file,
            name,
            relative_path: virtual_path,
            size: metadata.len(),
            modified: modified_time(&metadata),
        })
    }
}

/// Name used when sanitization leaves nothing usable
fn fallback_file_name() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("file_{}", &hex[..8])
}

/// Directories between `root` and `dir` (inclusive) that do not exist yet, deepest first
async fn missing_directories(root: &Path, dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
    let mut missing = Vec::new();
    let mut probe = dir;

    while probe != root && !path_exists(probe).await? {
        missing.push(probe.to_path_buf());
        match probe.parent() {
            Some(parent) => probe = parent,
            None => break,
        }
    }

    Ok(missing)
}

/// Removes directories created for a failed upload, deepest first
async fn remove_directories(dirs: &[PathBuf]) {
    for dir in dirs {
        if let Err(e) = fs::remove_dir(dir).await {
            warn!("Failed to remove directory {}: {}", dir.display(), e);
            break;
        }
    }
}

/// Claims the first free name among `name`, `stem_1.ext`, `stem_2.ext`, ...
async fn claim_unique_name(dir: &Path, name: &str) -> Result<(String, File), StorageError> {
    let (stem, extension) = split_extension(name);
    let mut counter = 0u64;

    loop {
        let candidate = if counter == 0 {
            name.to_string()
        } else {
            format!("{}_{}{}", stem, counter, extension)
        };

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dir.join(&candidate))
            .await
        {
            Ok(file) => return Ok((candidate, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => counter += 1,
            Err(e) => return Err(StorageError::from(e)),
        }
    }
}
