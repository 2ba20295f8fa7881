//! Conversion between the in-memory bundle and the unified path layout.

use chrono::Utc;
use folio_storage::{StorageBackend, StorageError};
use folio_types::{
    AccountRecord, Bundle, DocumentContent, DocumentId, DocumentMetadata, FileContent, FileKind,
    FileMetadata, Manifest, ProjectData, ProjectId, ProjectMetadata, UserData,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::layout::{
    self, document_index_path, document_snapshot_path, document_text_path, file_content_path,
    file_index_path, project_dir, project_documents_dir, project_files_dir, project_metadata_path,
};
use crate::validate::{check_account_value, check_manifest_value, check_project_index_value};
use crate::{FormatError, FormatResult};

/// Which layout an export writes. Dispatched once at the top of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// The full unified layout, the only layout import understands.
    #[default]
    Unified,
    /// Just the file trees, no manifest or document snapshots. Useful for
    /// handing a project to someone outside Folio; not importable.
    FilesOnly,
}

// ── Writing ──────────────────────────────────────────────────────

/// Writes a bundle to storage under the unified layout: manifest, optional
/// account/user-data, the project index, then per-project subtrees. The
/// documents and files subtrees are only written when non-empty.
pub async fn write_unified_structure(
    backend: &mut StorageBackend,
    bundle: &Bundle,
) -> FormatResult<()> {
    debug!(
        backend = backend.kind(),
        projects = bundle.projects.len(),
        "writing unified structure"
    );

    write_json(backend, layout::MANIFEST, &bundle.manifest).await?;
    if let Some(account) = &bundle.account {
        write_json(backend, layout::ACCOUNT, account).await?;
    }
    if let Some(user_data) = &bundle.user_data {
        write_json(backend, layout::USER_DATA, user_data).await?;
    }
    write_json(backend, layout::PROJECT_INDEX, &bundle.projects).await?;

    for meta in &bundle.projects {
        let id = meta.id;
        backend.create_directory(&project_dir(&id)).await?;
        write_json(backend, &project_metadata_path(&id), meta).await?;

        let Some(data) = bundle.project_data.get(&id) else {
            continue;
        };

        if !data.documents.is_empty() {
            backend.create_directory(&project_documents_dir(&id)).await?;
            write_json(backend, &document_index_path(&id), &data.documents).await?;

            for doc in &data.documents {
                let Some(content) = data.document_contents.get(&doc.id) else {
                    continue;
                };
                if let Some(snapshot) = &content.snapshot {
                    backend
                        .write_file(
                            &document_snapshot_path(&id, &doc.id),
                            &FileContent::Binary(snapshot.clone()),
                        )
                        .await?;
                }
                if let Some(text) = &content.readable_text {
                    backend
                        .write_file(
                            &document_text_path(&id, &doc.id),
                            &FileContent::Text(text.clone()),
                        )
                        .await?;
                }
            }
        }

        if !data.files.is_empty() {
            backend.create_directory(&project_files_dir(&id)).await?;
            write_json(backend, &file_index_path(&id), &data.files).await?;

            for (path, content) in &data.file_contents {
                backend
                    .write_file(&file_content_path(&id, path), content)
                    .await?;
            }
        }
    }

    Ok(())
}

/// Writes only each project's file tree, rooted at the project name.
///
/// No manifest and no snapshots are written, so the resulting tree is not
/// recognized by [`read_unified_structure`].
pub async fn write_files_only(backend: &mut StorageBackend, bundle: &Bundle) -> FormatResult<()> {
    debug!(
        backend = backend.kind(),
        projects = bundle.projects.len(),
        "writing files-only export"
    );

    for meta in &bundle.projects {
        let Some(data) = bundle.project_data.get(&meta.id) else {
            continue;
        };
        let root = sanitize_name(&meta.name);
        for (path, content) in &data.file_contents {
            backend
                .write_file(&format!("{root}/{path}"), content)
                .await?;
        }
    }

    Ok(())
}

fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '-' } else { c })
        .collect();
    if cleaned.trim().is_empty() {
        "untitled".to_string()
    } else {
        cleaned.trim().to_string()
    }
}

// ── Reading ──────────────────────────────────────────────────────

/// Reads a bundle from storage under the unified layout.
///
/// A missing manifest is [`FormatError::NoBackupFound`]. Missing
/// `account.json` / `userdata.json` are tolerated. Documents are located
/// under the `documents/` subtree, or (for trees written by older versions)
/// as `*.snapshot` entries at the project root; their metadata comes from
/// the index file when present and is inferred from the snapshot entries
/// when not.
pub async fn read_unified_structure(backend: &StorageBackend) -> FormatResult<Bundle> {
    let manifest_value = match read_json_value(backend, layout::MANIFEST).await {
        Ok(v) => v,
        Err(FormatError::Storage(StorageError::NotFound(_))) => {
            return Err(FormatError::NoBackupFound)
        }
        Err(e) => return Err(e),
    };
    check_manifest_value(&manifest_value)?;
    let manifest: Manifest = serde_json::from_value(manifest_value)?;

    let account: Option<AccountRecord> = match read_optional_json_value(backend, layout::ACCOUNT)
        .await?
    {
        Some(value) => {
            check_account_value(&value)?;
            Some(serde_json::from_value(value)?)
        }
        None => None,
    };
    let user_data: Option<UserData> = read_optional_json(backend, layout::USER_DATA).await?;

    let index_value = match read_json_value(backend, layout::PROJECT_INDEX).await {
        Ok(v) => v,
        Err(FormatError::Storage(StorageError::NotFound(_))) => {
            return Err(FormatError::Validation("projects.json missing".into()))
        }
        Err(e) => return Err(e),
    };
    check_project_index_value(&index_value)?;
    let projects: Vec<ProjectMetadata> = serde_json::from_value(index_value)?;

    let mut bundle = Bundle::new(manifest);
    bundle.account = account;
    bundle.user_data = user_data;

    for indexed in projects {
        let id = indexed.id;
        // The per-project metadata file wins over the index record when both
        // exist; the index is just a listing.
        let metadata = read_optional_json::<ProjectMetadata>(backend, &project_metadata_path(&id))
            .await?
            .unwrap_or(indexed);

        let mut data = ProjectData::new(metadata);
        read_project_documents(backend, &id, &mut data).await?;
        read_project_files(backend, &id, &mut data).await?;
        bundle.insert_project(data);
    }

    Ok(bundle)
}

async fn read_project_documents(
    backend: &StorageBackend,
    id: &ProjectId,
    data: &mut ProjectData,
) -> FormatResult<()> {
    let documents_dir = project_documents_dir(id);
    let (snapshot_dir, has_subtree) = if backend.exists(&documents_dir).await? {
        (documents_dir.clone(), true)
    } else {
        // Older trees kept snapshots at the project root.
        (project_dir(id), false)
    };

    let documents = match read_optional_json::<Vec<DocumentMetadata>>(
        backend,
        &document_index_path(id),
    )
    .await?
    {
        Some(documents) => documents,
        None => infer_documents(backend, &snapshot_dir, has_subtree).await?,
    };

    for doc in &documents {
        let snapshot = read_optional_bytes(
            backend,
            &format!("{snapshot_dir}/{}.{}", doc.id, layout::SNAPSHOT_EXT),
        )
        .await?;
        let readable_text =
            match read_optional_file(backend, &format!("{snapshot_dir}/{}.txt", doc.id)).await? {
                Some(FileContent::Text(s)) => Some(s),
                Some(FileContent::Binary(b)) => Some(String::from_utf8_lossy(&b).into_owned()),
                None => None,
            };
        data.document_contents.insert(
            doc.id,
            DocumentContent {
                snapshot,
                readable_text,
            },
        );
    }
    data.documents = documents;
    Ok(())
}

/// Builds one metadata entry per `*.snapshot` file when no index exists.
async fn infer_documents(
    backend: &StorageBackend,
    dir: &str,
    dir_known_present: bool,
) -> FormatResult<Vec<DocumentMetadata>> {
    if !dir_known_present && !backend.exists(dir).await? {
        return Ok(Vec::new());
    }
    let names = match backend.list_directory(dir).await {
        Ok(names) => names,
        Err(StorageError::NotFound(_)) => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut documents = Vec::new();
    for name in names {
        let Some(stem) = name.strip_suffix(&format!(".{}", layout::SNAPSHOT_EXT)) else {
            continue;
        };
        let Ok(doc_id) = DocumentId::parse(stem) else {
            warn!(entry = %name, "skipping snapshot entry with unparseable id");
            continue;
        };
        documents.push(DocumentMetadata {
            id: doc_id,
            name: stem.to_string(),
            last_modified: Utc::now(),
            has_snapshot_state: true,
            has_readable_content: false,
        });
    }
    Ok(documents)
}

async fn read_project_files(
    backend: &StorageBackend,
    id: &ProjectId,
    data: &mut ProjectData,
) -> FormatResult<()> {
    let Some(files) =
        read_optional_json::<Vec<FileMetadata>>(backend, &file_index_path(id)).await?
    else {
        return Ok(());
    };

    for file in &files {
        if file.kind != FileKind::File {
            continue;
        }
        let path = file.normalized_path().to_string();
        match read_optional_file(backend, &file_content_path(id, &path)).await? {
            Some(content) => {
                data.file_contents.insert(path, content);
            }
            None => warn!(%id, path, "file listed in index but content missing"),
        }
    }
    data.files = files;
    Ok(())
}

// ── JSON helpers ─────────────────────────────────────────────────

async fn write_json<T: Serialize>(
    backend: &mut StorageBackend,
    path: &str,
    value: &T,
) -> FormatResult<()> {
    let text = serde_json::to_string_pretty(value)?;
    backend
        .write_file(path, &FileContent::Text(text))
        .await
        .map_err(Into::into)
}

async fn read_json_value(backend: &StorageBackend, path: &str) -> FormatResult<Value> {
    let content = backend.read_file(path).await?;
    Ok(serde_json::from_slice(content.as_bytes())?)
}

async fn read_optional_json_value(
    backend: &StorageBackend,
    path: &str,
) -> FormatResult<Option<Value>> {
    match read_json_value(backend, path).await {
        Ok(v) => Ok(Some(v)),
        Err(FormatError::Storage(StorageError::NotFound(_))) => Ok(None),
        Err(e) => Err(e),
    }
}

async fn read_optional_json<T: DeserializeOwned>(
    backend: &StorageBackend,
    path: &str,
) -> FormatResult<Option<T>> {
    match read_optional_json_value(backend, path).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

async fn read_optional_file(
    backend: &StorageBackend,
    path: &str,
) -> FormatResult<Option<FileContent>> {
    match backend.read_file(path).await {
        Ok(content) => Ok(Some(content)),
        Err(StorageError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn read_optional_bytes(
    backend: &StorageBackend,
    path: &str,
) -> FormatResult<Option<Vec<u8>>> {
    Ok(read_optional_file(backend, path)
        .await?
        .map(|c| c.as_bytes().to_vec()))
}
