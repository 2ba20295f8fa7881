//! Unified bundle format codec.
//!
//! Defines the canonical path layout of a backup bundle and converts between
//! the in-memory [`folio_types::Bundle`] and that layout, using only the
//! [`folio_storage::StorageBackend`] interface; the codec never knows which
//! backend is active.
//!
//! Layout:
//!
//! ```text
//! manifest.json
//! account.json            (optional)
//! userdata.json           (optional)
//! projects.json
//! projects/<projectId>/metadata.json
//! projects/<projectId>/documents/metadata.json
//! projects/<projectId>/documents/<docId>.snapshot
//! projects/<projectId>/documents/<docId>.txt
//! projects/<projectId>/files/metadata.json
//! projects/<projectId>/files/<relative/path...>
//! ```

mod codec;
mod layout;
mod validate;

pub use codec::{
    read_unified_structure, write_files_only, write_unified_structure, ExportFormat,
};
pub use layout::{
    account_path, manifest_path, project_dir, project_documents_dir, project_files_dir,
    project_index_path, user_data_path,
};
pub use validate::validate_bundle;

use thiserror::Error;

/// Result type for codec operations.
pub type FormatResult<T> = Result<T, FormatError>;

/// Errors distinguishing "this isn't a backup" from "couldn't reach storage".
#[derive(Debug, Error)]
pub enum FormatError {
    /// No manifest at the destination, meaning there is no backup here at all.
    /// Distinct from a generic I/O failure so callers can say so.
    #[error("no backup found at destination")]
    NoBackupFound,

    /// The manifest exists but fails the minimum structural checks.
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// The bundle tree fails structural validation.
    #[error("invalid bundle structure: {0}")]
    Validation(String),

    /// Malformed JSON in a bundle artifact.
    #[error("malformed bundle artifact: {0}")]
    Json(#[from] serde_json::Error),

    /// The storage adapter failed underneath the codec.
    #[error(transparent)]
    Storage(#[from] folio_storage::StorageError),
}
