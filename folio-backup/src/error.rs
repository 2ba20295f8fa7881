//! Error types for the backup engine.
//!
//! The taxonomy keeps three caller-visible families apart: access errors
//! (storage unreachable, handle invalidated), format errors ("this isn't a
//! backup"), and store errors from the injected document/file/index stores.
//! Per-project errors during a batch import never surface here; they are
//! isolated into the batch's result slots.

use thiserror::Error;

/// Result type for backup engine operations.
pub type BackupResult<T> = Result<T, BackupError>;

/// Errors that can occur in backup engine operations.
#[derive(Debug, Error)]
pub enum BackupError {
    /// Automatic operations are gated off by the user preference.
    #[error("backup is disabled")]
    Disabled,

    /// No storage destination is connected.
    #[error("no storage destination connected")]
    NotConnected,

    /// The destination could not be reached or the grant was invalidated.
    #[error("storage access failed: {0}")]
    Access(#[from] folio_storage::StorageError),

    /// The destination tree is not a valid bundle (includes the distinct
    /// "no backup found" condition).
    #[error(transparent)]
    Format(#[from] folio_format::FormatError),

    /// A document/file/index store operation failed.
    #[error("store error: {0}")]
    Store(String),

    /// The requested project does not exist where it was looked for.
    #[error("project not found: {0}")]
    ProjectNotFound(folio_types::ProjectId),
}

impl BackupError {
    /// True when the failure means "there is no backup at the destination",
    /// as opposed to "the destination could not be read".
    #[must_use]
    pub fn is_no_backup_found(&self) -> bool {
        matches!(self, Self::Format(folio_format::FormatError::NoBackupFound))
    }
}
