//! Live directory backend, rooted at a user-granted directory.
//!
//! The grant can be invalidated between calls (the directory deleted or made
//! unreadable), so every operation maps raw I/O failures back into the
//! adapter taxonomy rather than assuming the root is still valid.

use std::path::{Path, PathBuf};

use folio_types::FileContent;
use tracing::debug;

use crate::classify::{content_kind, ContentKind};
use crate::error::{StorageError, StorageResult};
use crate::normalize_path;

/// Storage adapter backed by a real filesystem directory.
#[derive(Debug, Clone)]
pub struct DirectoryAdapter {
    root: PathBuf,
}

impl DirectoryAdapter {
    /// Opens an adapter rooted at `root`.
    ///
    /// Verifies the root currently exists and is a directory; this is the
    /// moral equivalent of a granted directory handle, and later calls can
    /// still fail if the grant is invalidated.
    pub async fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        let display = root.display().to_string();
        let meta = tokio::fs::metadata(&root)
            .await
            .map_err(|e| StorageError::from_io(e, &display))?;
        if !meta.is_dir() {
            return Err(StorageError::InvalidPath(display));
        }
        Ok(Self { root })
    }

    /// Returns the root directory this adapter is bound to.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> StorageResult<PathBuf> {
        let normalized = normalize_path(path)?;
        Ok(self.root.join(normalized))
    }

    pub(crate) async fn write_file(&self, path: &str, content: &FileContent) -> StorageResult<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::from_io(e, path))?;
        }
        debug!(path, bytes = content.len(), "writing file");
        tokio::fs::write(&full, content.as_bytes())
            .await
            .map_err(|e| StorageError::from_io(e, path))
    }

    pub(crate) async fn read_file(&self, path: &str) -> StorageResult<FileContent> {
        let full = self.resolve(path)?;
        let bytes = tokio::fs::read(&full)
            .await
            .map_err(|e| StorageError::from_io(e, path))?;
        Ok(match content_kind(path) {
            // A text extension with invalid UTF-8 inside stays binary so the
            // bytes survive unchanged.
            ContentKind::Text => match String::from_utf8(bytes) {
                Ok(text) => FileContent::Text(text),
                Err(e) => FileContent::Binary(e.into_bytes()),
            },
            ContentKind::Binary => FileContent::Binary(bytes),
        })
    }

    pub(crate) async fn create_directory(&self, path: &str) -> StorageResult<()> {
        let full = self.resolve(path)?;
        tokio::fs::create_dir_all(&full)
            .await
            .map_err(|e| StorageError::from_io(e, path))
    }

    pub(crate) async fn exists(&self, path: &str) -> StorageResult<bool> {
        let full = self.resolve(path)?;
        match tokio::fs::metadata(&full).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::from_io(e, path)),
        }
    }

    pub(crate) async fn list_directory(&self, path: &str) -> StorageResult<Vec<String>> {
        let full = self.resolve(path)?;
        let mut dir = tokio::fs::read_dir(&full)
            .await
            .map_err(|e| StorageError::from_io(e, path))?;
        let mut names = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| StorageError::from_io(e, path))?
        {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}
