//! Core type definitions for the Folio backup engine.
//!
//! This crate defines the storage-agnostic types shared by the codec, the
//! storage adapters, and the reconciliation engine:
//! - Project / document / account identifiers and the `scheme:opaque-id`
//!   document URL handle
//! - The versioned bundle manifest and per-entity metadata records
//! - The transient in-memory [`Bundle`] assembled for every backup/export
//! - Backup status and the capped activity log
//!
//! Everything here is a *view* built on demand per operation; the only
//! durable state lives behind the store traits in `folio-backup` and behind
//! the storage adapters in `folio-storage`.

mod activity;
mod bundle;
mod ids;
mod manifest;
mod metadata;
mod status;

pub use activity::{ActivityKind, ActivityLog, BackupActivity, ACTIVITY_LOG_CAP};
pub use bundle::{Bundle, DocumentContent, FileContent, ProjectData};
pub use ids::{AccountId, DocumentId, DocumentUrl, ProjectId};
pub use manifest::{BundleMode, Manifest, FORMAT_VERSION};
pub use metadata::{
    AccountRecord, DocumentMetadata, FileKind, FileMetadata, ProjectMetadata, UserData,
};
pub use status::{BackupState, BackupStatus, BundleSource, ImportableProject};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid document URL: {0}")]
    InvalidDocumentUrl(String),
}
