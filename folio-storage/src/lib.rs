//! Storage adapters for the Folio backup engine.
//!
//! Everything above this layer talks to a [`StorageBackend`] and never knows
//! which backend is active:
//! - [`DirectoryAdapter`]: a live backend bound to a user-granted directory
//! - [`ArchiveAdapter`]: a single compressed container built/read in memory
//!
//! Paths are always forward-slash and project-relative; leading slashes are
//! stripped. Binary versus text is decided by a filename classifier
//! ([`content_kind`]), not by callers.

mod archive;
mod classify;
mod directory;
mod error;

pub use archive::ArchiveAdapter;
pub use classify::{content_kind, ContentKind};
pub use directory::DirectoryAdapter;
pub use error::{StorageError, StorageResult};

use folio_types::FileContent;

/// Normalizes an adapter path: strips leading slashes, rejects empty paths,
/// backslashes, and `..` segments.
pub fn normalize_path(path: &str) -> StorageResult<String> {
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    if trimmed.contains('\\') || trimmed.split('/').any(|seg| seg.is_empty() || seg == "..") {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    Ok(trimmed.to_string())
}

/// The active storage backend, dispatched once at the top of each operation.
#[derive(Debug)]
pub enum StorageBackend {
    Directory(DirectoryAdapter),
    Archive(ArchiveAdapter),
}

impl StorageBackend {
    /// Writes `content` at `path`, creating intermediate directories.
    pub async fn write_file(&mut self, path: &str, content: &FileContent) -> StorageResult<()> {
        match self {
            Self::Directory(d) => d.write_file(path, content).await,
            Self::Archive(a) => a.write_file(path, content),
        }
    }

    /// Reads the content at `path`. Text versus binary is decided by the
    /// filename classifier. A missing path (or missing intermediate
    /// directory) surfaces [`StorageError::NotFound`].
    pub async fn read_file(&self, path: &str) -> StorageResult<FileContent> {
        match self {
            Self::Directory(d) => d.read_file(path).await,
            Self::Archive(a) => a.read_file(path),
        }
    }

    /// Creates a directory (and intermediate segments). Idempotent.
    pub async fn create_directory(&mut self, path: &str) -> StorageResult<()> {
        match self {
            Self::Directory(d) => d.create_directory(path).await,
            Self::Archive(a) => a.create_directory(path),
        }
    }

    /// Returns whether `path` exists. For the archive backend a directory
    /// path exists if any entry has it as a prefix.
    pub async fn exists(&self, path: &str) -> StorageResult<bool> {
        match self {
            Self::Directory(d) => d.exists(path).await,
            Self::Archive(a) => a.exists(path),
        }
    }

    /// Lists immediate child names of a directory.
    pub async fn list_directory(&self, path: &str) -> StorageResult<Vec<String>> {
        match self {
            Self::Directory(d) => d.list_directory(path).await,
            Self::Archive(a) => a.list_directory(path),
        }
    }

    /// Short backend name for log lines.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Directory(_) => "directory",
            Self::Archive(_) => "archive",
        }
    }
}
