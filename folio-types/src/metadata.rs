//! Per-entity metadata records serialized into a bundle.
//!
//! These are views built fresh each time a backup/export/import runs, not
//! long-lived objects. Field names serialize in camelCase to match the
//! unified on-disk format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, DocumentId, DocumentUrl, ProjectId};

/// Metadata for one project in a bundle.
///
/// Invariant: `id` is unique within a bundle; `document_url`'s opaque id is
/// the external key into the document and file stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub document_url: DocumentUrl,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner_id: AccountId,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_favorite: bool,
    /// When this project was last synchronized to a backup destination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Utc>>,
    /// When this record was written into a bundle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
}

/// Metadata for one document within a project. A project has zero or more.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub id: DocumentId,
    pub name: String,
    pub last_modified: DateTime<Utc>,
    /// Whether a full-state snapshot was captured for this document.
    #[serde(default)]
    pub has_snapshot_state: bool,
    /// Whether a plain-text rendering was captured for this document.
    #[serde(default)]
    pub has_readable_content: bool,
}

/// Whether a file entry is a regular file or a directory marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Directory,
}

/// Metadata for one file (or directory entry) within a project.
///
/// `path` is project-relative and POSIX-style; a leading slash is optional.
/// Invariants: directory entries carry no content; `linked_document_id`,
/// when set, references an existing [`DocumentMetadata`] id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub id: String,
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub last_modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_binary: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_document_id: Option<DocumentId>,
    /// Soft-deletion flag, carried through backups that include deleted
    /// files so a restore does not resurrect them.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_deleted: bool,
}

impl FileMetadata {
    /// Returns the path with any leading slash stripped, the form used as a
    /// key under the `files/` subtree.
    #[must_use]
    pub fn normalized_path(&self) -> &str {
        self.path.trim_start_matches('/')
    }
}

/// The minimal account record a bundle carries (`account.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    pub id: AccountId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Opaque per-user settings blob carried alongside the account
/// (`userdata.json`). The engine round-trips it without interpreting it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserData(pub serde_json::Value);
