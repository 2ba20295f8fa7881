//! Entity serializer: bridges the in-memory bundle and the live stores.
//!
//! Capture reads CRDT snapshots and file blobs out of the per-document and
//! per-project stores into a [`ProjectData`]; restore writes them back.
//! Capture is best-effort: a document store that never reaches a synced
//! state within the bounded wait is read anyway, and the shortfall is only
//! logged.

use std::sync::Arc;
use std::time::Duration;

use folio_types::{DocumentContent, FileKind, ProjectData, ProjectMetadata};
use tracing::{debug, warn};

use crate::error::BackupResult;
use crate::stores::{DocumentStore, FileRecord, FileStore, ProjectDisplay, WriteOptions};

/// Default bounded wait for a document store to reach a synced state.
pub const DEFAULT_SYNC_WAIT: Duration = Duration::from_secs(5);

/// Reads and writes CRDT document snapshots and file blobs between the
/// opaque stores and the in-memory bundle.
#[derive(Clone)]
pub struct EntitySerializer {
    documents: Arc<dyn DocumentStore>,
    files: Arc<dyn FileStore>,
    sync_wait: Duration,
}

impl EntitySerializer {
    /// Creates a serializer over the given stores with the default sync wait.
    pub fn new(documents: Arc<dyn DocumentStore>, files: Arc<dyn FileStore>) -> Self {
        Self {
            documents,
            files,
            sync_wait: DEFAULT_SYNC_WAIT,
        }
    }

    /// Overrides the bounded wait applied before reading each document.
    #[must_use]
    pub fn with_sync_wait(mut self, sync_wait: Duration) -> Self {
        self.sync_wait = sync_wait;
        self
    }

    /// Captures a project's documents and files into a [`ProjectData`].
    ///
    /// Each document gets a bounded wait for its store to sync; on timeout
    /// the capture proceeds with whatever state is available rather than
    /// blocking indefinitely.
    pub async fn capture_project(
        &self,
        metadata: &ProjectMetadata,
        include_soft_deleted: bool,
    ) -> BackupResult<ProjectData> {
        let opaque = metadata.document_url.opaque_id();
        let mut data = ProjectData::new(metadata.clone());

        let documents = self.documents.document_index(opaque).await?;
        debug!(project = %metadata.id, count = documents.len(), "capturing documents");

        for doc in &documents {
            if let Err(e) = self
                .documents
                .wait_until_synced(opaque, &doc.id, self.sync_wait)
                .await
            {
                // Not fatal: an empty or partial document is still usable.
                warn!(document = %doc.id, "document store not synced, capturing best-effort: {e}");
            }

            let snapshot = self.documents.full_state_snapshot(opaque, &doc.id).await?;
            let readable_text = self.documents.plain_text(opaque, &doc.id).await?;
            data.document_contents.insert(
                doc.id,
                DocumentContent {
                    snapshot: Some(snapshot),
                    readable_text,
                },
            );
        }
        data.documents = documents;

        let records = self
            .files
            .list_all_files(opaque, include_soft_deleted)
            .await?;
        for record in records {
            let FileRecord {
                mut metadata,
                content,
                deleted,
            } = record;
            metadata.is_deleted = deleted;
            if metadata.kind == FileKind::File {
                let content = match content {
                    Some(content) => Some(content),
                    None => self.files.file_content(opaque, &metadata.id).await?,
                };
                if let Some(content) = content {
                    data.file_contents
                        .insert(metadata.normalized_path().to_string(), content);
                }
            }
            data.files.push(metadata);
        }

        Ok(data)
    }

    /// Restores a project's documents and files into the local stores under
    /// `final_meta`, the record as it will exist locally, which may carry a
    /// remapped id, name, and document URL.
    ///
    /// Document restore is idempotent: applying the same snapshot twice
    /// yields the same final state.
    pub async fn restore_project(
        &self,
        data: &ProjectData,
        final_meta: &ProjectMetadata,
    ) -> BackupResult<()> {
        let opaque = final_meta.document_url.opaque_id();

        for doc in &data.documents {
            let Some(content) = data.document_contents.get(&doc.id) else {
                continue;
            };
            if let Some(snapshot) = &content.snapshot {
                self.documents
                    .apply_full_state_snapshot(opaque, &doc.id, snapshot)
                    .await?;
                self.documents.flush(opaque, &doc.id).await?;
            }
        }

        let display = ProjectDisplay {
            name: final_meta.name.clone(),
            description: final_meta.description.clone(),
        };
        self.documents
            .rebuild_index(opaque, &data.documents, &display)
            .await?;

        if data.files.is_empty() {
            return Ok(());
        }

        if !self.files.is_connected(opaque).await {
            self.files.connect(&final_meta.document_url).await?;
        }

        let records: Vec<FileRecord> = data
            .files
            .iter()
            .map(|meta| FileRecord {
                content: match meta.kind {
                    FileKind::File => data.file_contents.get(meta.normalized_path()).cloned(),
                    FileKind::Directory => None,
                },
                metadata: meta.clone(),
                deleted: meta.is_deleted,
            })
            .collect();

        if let Err(e) = self
            .files
            .batch_write(opaque, &records, WriteOptions::restore())
            .await
        {
            // Import must never silently drop files: push the same records
            // through the low-level path instead.
            warn!(project = %final_meta.id, "batch write failed ({e}), falling back to raw record write");
            self.files.write_raw_records(opaque, &records).await?;
        }

        Ok(())
    }
}
