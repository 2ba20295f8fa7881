//! Error types for the storage adapters.
//!
//! Callers only distinguish three conditions: a path exists, it does not
//! exist, or some other I/O failure occurred. Backend-specific failures are
//! folded into those three.

use thiserror::Error;

/// Result type for storage adapter operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage adapter operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The path (or an intermediate directory on the way to it) does not
    /// exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The granted storage handle is no longer usable (permission revoked,
    /// directory deleted out from under us).
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A path that cannot be used with the adapter (empty, or escaping the
    /// root with `..`).
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Any other I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive container failure (corrupt or unreadable zip data).
    #[error("archive error: {0}")]
    Archive(String),
}

impl StorageError {
    /// Maps a raw I/O error for `path` into the adapter taxonomy.
    pub(crate) fn from_io(err: std::io::Error, path: &str) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_string()),
            _ => Self::Io(err),
        }
    }
}
