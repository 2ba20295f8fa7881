//! Narrow store interfaces injected into the engine.
//!
//! The CRDT document engine, the per-project file store, and the account's
//! project index are external collaborators. Modeling them as traits lets
//! the reconciliation logic run against in-memory fakes in tests, without a
//! real CRDT engine underneath.
//!
//! Stores are keyed by a project's *opaque id*, the part of its
//! [`DocumentUrl`] after the scheme prefix, never by the local project id,
//! which differs across local databases.

use std::time::Duration;

use async_trait::async_trait;
use folio_types::{
    AccountId, AccountRecord, DocumentId, DocumentMetadata, DocumentUrl, FileContent,
    FileMetadata, ProjectId, ProjectMetadata, UserData,
};

use crate::error::BackupResult;

/// One file as the file store sees it, including its soft-deletion flag.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub metadata: FileMetadata,
    /// Raw content; `None` for directory entries and for listings that have
    /// not pulled content yet.
    pub content: Option<FileContent>,
    /// Soft-deletion flag carried by the store.
    pub deleted: bool,
}

/// Options for the file store's batch-write operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Suppress interactive conflict dialogs. Always set during restore.
    pub skip_conflict_prompt: bool,
    /// Keep the original `last_modified` timestamps instead of stamping now.
    pub preserve_timestamps: bool,
    /// Keep soft-deletion flags on the written records.
    pub preserve_deletion_flag: bool,
}

impl WriteOptions {
    /// The options every restore uses: silent, timestamp-preserving,
    /// deletion-flag-preserving.
    #[must_use]
    pub fn restore() -> Self {
        Self {
            skip_conflict_prompt: true,
            preserve_timestamps: true,
            preserve_deletion_flag: true,
        }
    }
}

/// Display fields rebuilt alongside a project's document index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectDisplay {
    pub name: String,
    pub description: String,
}

/// Per-document CRDT store access, keyed by project opaque id + document id.
///
/// Each call opens a short-lived connection to that document's own store;
/// the engine never holds a document store open across operations.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads the project's document index from its metadata store.
    async fn document_index(&self, project: &str) -> BackupResult<Vec<DocumentMetadata>>;

    /// Waits until the document's store reports a synced state, up to
    /// `timeout`. Timing out is an error the caller is expected to tolerate
    /// by proceeding with whatever state is available.
    async fn wait_until_synced(
        &self,
        project: &str,
        document: &DocumentId,
        timeout: Duration,
    ) -> BackupResult<()>;

    /// Obtains a full-state snapshot of the document.
    async fn full_state_snapshot(
        &self,
        project: &str,
        document: &DocumentId,
    ) -> BackupResult<Vec<u8>>;

    /// Best-effort plain-text rendering of the document.
    async fn plain_text(
        &self,
        project: &str,
        document: &DocumentId,
    ) -> BackupResult<Option<String>>;

    /// Applies a full-state snapshot as a single state update. CRDT
    /// snapshots are replayable: applying the same snapshot twice yields
    /// the same final state.
    async fn apply_full_state_snapshot(
        &self,
        project: &str,
        document: &DocumentId,
        snapshot: &[u8],
    ) -> BackupResult<()>;

    /// Forces a persistence flush of the document's store.
    async fn flush(&self, project: &str, document: &DocumentId) -> BackupResult<()>;

    /// Rebuilds the project metadata store's document index and auxiliary
    /// display fields in one transaction.
    async fn rebuild_index(
        &self,
        project: &str,
        documents: &[DocumentMetadata],
        display: &ProjectDisplay,
    ) -> BackupResult<()>;
}

/// Per-project file store access, keyed by project opaque id.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Lists all file records, optionally including soft-deleted ones.
    /// Content is not pulled by the listing.
    async fn list_all_files(
        &self,
        project: &str,
        include_soft_deleted: bool,
    ) -> BackupResult<Vec<FileRecord>>;

    /// Pulls the raw content of one file by its store id.
    async fn file_content(&self, project: &str, file_id: &str)
        -> BackupResult<Option<FileContent>>;

    /// Writes a batch of records through the store's normal path.
    async fn batch_write(
        &self,
        project: &str,
        records: &[FileRecord],
        options: WriteOptions,
    ) -> BackupResult<()>;

    /// Low-level fallback: writes the same records directly into the
    /// equivalent local schema, used when [`FileStore::batch_write`] fails
    /// so an import never silently drops files.
    async fn write_raw_records(&self, project: &str, records: &[FileRecord]) -> BackupResult<()>;

    /// Whether the store is connected for this project.
    async fn is_connected(&self, project: &str) -> bool;

    /// Connects the store for the project behind `document_url`.
    async fn connect(&self, document_url: &DocumentUrl) -> BackupResult<()>;
}

/// The account's project index.
#[async_trait]
pub trait ProjectIndex: Send + Sync {
    /// Lists the projects owned by `user`.
    async fn projects_for_user(&self, user: &AccountId) -> BackupResult<Vec<ProjectMetadata>>;

    /// Looks up one project by id.
    async fn project_by_id(&self, id: &ProjectId) -> BackupResult<Option<ProjectMetadata>>;

    /// Inserts or replaces a project record directly, bypassing normal
    /// create-project side effects.
    async fn insert_or_replace(&self, record: &ProjectMetadata) -> BackupResult<()>;

    /// Deletes a project record and cleans up its associated stores.
    async fn delete_project_and_cleanup(&self, id: &ProjectId) -> BackupResult<()>;

    /// The minimal account record serialized into bundles, if any.
    async fn account_record(&self) -> BackupResult<Option<AccountRecord>>;

    /// The opaque per-user settings blob serialized into bundles, if any.
    async fn user_data(&self) -> BackupResult<Option<UserData>>;
}
