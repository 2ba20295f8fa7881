//! In-memory store fakes shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use folio_backup::{
    BackupError, BackupResult, DocumentStore, FileRecord, FileStore, ProjectDisplay,
    ProjectIndex, WriteOptions,
};
use folio_types::{
    AccountId, AccountRecord, DocumentId, DocumentMetadata, DocumentUrl, FileContent, FileKind,
    FileMetadata, ProjectId, ProjectMetadata, UserData,
};

/// Installs a test-writer subscriber once so `RUST_LOG` works in tests.
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// ── Builders ─────────────────────────────────────────────────────

pub fn project_meta(name: &str, opaque: &str, owner: AccountId) -> ProjectMetadata {
    ProjectMetadata {
        id: ProjectId::new(),
        name: name.to_string(),
        description: format!("{name} description"),
        document_url: DocumentUrl::new("folio", opaque).unwrap(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
        owner_id: owner,
        tags: Vec::new(),
        is_favorite: false,
        last_sync: None,
        exported_at: None,
    }
}

pub fn doc_meta(name: &str) -> DocumentMetadata {
    DocumentMetadata {
        id: DocumentId::new(),
        name: name.to_string(),
        last_modified: Utc::now(),
        has_snapshot_state: true,
        has_readable_content: true,
    }
}

pub fn file_meta(id: &str, path: &str) -> FileMetadata {
    FileMetadata {
        id: id.to_string(),
        name: path.rsplit('/').next().unwrap_or(path).to_string(),
        path: path.to_string(),
        kind: FileKind::File,
        last_modified: Utc::now(),
        size: None,
        mime_type: None,
        is_binary: None,
        linked_document_id: None,
        is_deleted: false,
    }
}

pub fn account_record() -> AccountRecord {
    AccountRecord {
        id: AccountId::new(),
        username: "tester".to_string(),
        email: None,
        created_at: Utc::now(),
    }
}

// ── Document store fake ──────────────────────────────────────────

#[derive(Default)]
struct ProjectDocs {
    index: Vec<DocumentMetadata>,
    snapshots: HashMap<DocumentId, Vec<u8>>,
    texts: HashMap<DocumentId, String>,
    display: ProjectDisplay,
    flushes: usize,
}

/// In-memory stand-in for the per-document CRDT stores.
#[derive(Default)]
pub struct MemoryDocumentStore {
    projects: Mutex<HashMap<String, ProjectDocs>>,
    /// Documents for which `wait_until_synced` reports a timeout.
    unsynced: Mutex<HashSet<DocumentId>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_document(
        &self,
        project: &str,
        meta: DocumentMetadata,
        snapshot: Vec<u8>,
        text: Option<String>,
    ) {
        let mut projects = self.projects.lock().unwrap();
        let docs = projects.entry(project.to_string()).or_default();
        docs.snapshots.insert(meta.id, snapshot);
        if let Some(text) = text {
            docs.texts.insert(meta.id, text);
        }
        docs.index.push(meta);
    }

    pub fn mark_unsynced(&self, document: DocumentId) {
        self.unsynced.lock().unwrap().insert(document);
    }

    pub fn snapshot_of(&self, project: &str, document: &DocumentId) -> Option<Vec<u8>> {
        self.projects
            .lock()
            .unwrap()
            .get(project)
            .and_then(|d| d.snapshots.get(document).cloned())
    }

    pub fn display_of(&self, project: &str) -> Option<ProjectDisplay> {
        self.projects
            .lock()
            .unwrap()
            .get(project)
            .map(|d| d.display.clone())
    }

    pub fn index_of(&self, project: &str) -> Vec<DocumentMetadata> {
        self.projects
            .lock()
            .unwrap()
            .get(project)
            .map(|d| d.index.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn document_index(&self, project: &str) -> BackupResult<Vec<DocumentMetadata>> {
        Ok(self
            .projects
            .lock()
            .unwrap()
            .get(project)
            .map(|d| d.index.clone())
            .unwrap_or_default())
    }

    async fn wait_until_synced(
        &self,
        _project: &str,
        document: &DocumentId,
        _timeout: Duration,
    ) -> BackupResult<()> {
        if self.unsynced.lock().unwrap().contains(document) {
            return Err(BackupError::Store(format!(
                "document {document} did not reach synced state"
            )));
        }
        Ok(())
    }

    async fn full_state_snapshot(
        &self,
        project: &str,
        document: &DocumentId,
    ) -> BackupResult<Vec<u8>> {
        self.projects
            .lock()
            .unwrap()
            .get(project)
            .and_then(|d| d.snapshots.get(document).cloned())
            .ok_or_else(|| BackupError::Store(format!("no snapshot for {document}")))
    }

    async fn plain_text(
        &self,
        project: &str,
        document: &DocumentId,
    ) -> BackupResult<Option<String>> {
        Ok(self
            .projects
            .lock()
            .unwrap()
            .get(project)
            .and_then(|d| d.texts.get(document).cloned()))
    }

    async fn apply_full_state_snapshot(
        &self,
        project: &str,
        document: &DocumentId,
        snapshot: &[u8],
    ) -> BackupResult<()> {
        let mut projects = self.projects.lock().unwrap();
        let docs = projects.entry(project.to_string()).or_default();
        docs.snapshots.insert(*document, snapshot.to_vec());
        Ok(())
    }

    async fn flush(&self, project: &str, _document: &DocumentId) -> BackupResult<()> {
        let mut projects = self.projects.lock().unwrap();
        projects.entry(project.to_string()).or_default().flushes += 1;
        Ok(())
    }

    async fn rebuild_index(
        &self,
        project: &str,
        documents: &[DocumentMetadata],
        display: &ProjectDisplay,
    ) -> BackupResult<()> {
        let mut projects = self.projects.lock().unwrap();
        let docs = projects.entry(project.to_string()).or_default();
        docs.index = documents.to_vec();
        docs.display = display.clone();
        Ok(())
    }
}

// ── File store fake ──────────────────────────────────────────────

/// In-memory stand-in for the per-project file stores.
#[derive(Default)]
pub struct MemoryFileStore {
    records: Mutex<HashMap<String, Vec<FileRecord>>>,
    contents: Mutex<HashMap<(String, String), FileContent>>,
    connected: Mutex<HashSet<String>>,
    fail_batch_write: AtomicBool,
    raw_write_used: AtomicBool,
    last_options: Mutex<Option<WriteOptions>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_file(&self, project: &str, meta: FileMetadata, content: FileContent) {
        self.contents
            .lock()
            .unwrap()
            .insert((project.to_string(), meta.id.clone()), content);
        self.records
            .lock()
            .unwrap()
            .entry(project.to_string())
            .or_default()
            .push(FileRecord {
                metadata: meta,
                content: None,
                deleted: false,
            });
        self.connected.lock().unwrap().insert(project.to_string());
    }

    pub fn seed_deleted_file(&self, project: &str, meta: FileMetadata, content: FileContent) {
        self.seed_file(project, meta, content);
        let mut records = self.records.lock().unwrap();
        if let Some(record) = records.get_mut(project).and_then(|r| r.last_mut()) {
            record.deleted = true;
        }
    }

    pub fn set_fail_batch_write(&self, fail: bool) {
        self.fail_batch_write.store(fail, Ordering::SeqCst);
    }

    pub fn raw_write_used(&self) -> bool {
        self.raw_write_used.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<WriteOptions> {
        *self.last_options.lock().unwrap()
    }

    pub fn records_of(&self, project: &str) -> Vec<FileRecord> {
        self.records
            .lock()
            .unwrap()
            .get(project)
            .cloned()
            .unwrap_or_default()
    }

    fn store_records(&self, project: &str, records: &[FileRecord]) {
        self.records
            .lock()
            .unwrap()
            .insert(project.to_string(), records.to_vec());
        let mut contents = self.contents.lock().unwrap();
        for record in records {
            if let Some(content) = &record.content {
                contents.insert(
                    (project.to_string(), record.metadata.id.clone()),
                    content.clone(),
                );
            }
        }
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn list_all_files(
        &self,
        project: &str,
        include_soft_deleted: bool,
    ) -> BackupResult<Vec<FileRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(project)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| include_soft_deleted || !r.deleted)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn file_content(
        &self,
        project: &str,
        file_id: &str,
    ) -> BackupResult<Option<FileContent>> {
        Ok(self
            .contents
            .lock()
            .unwrap()
            .get(&(project.to_string(), file_id.to_string()))
            .cloned())
    }

    async fn batch_write(
        &self,
        project: &str,
        records: &[FileRecord],
        options: WriteOptions,
    ) -> BackupResult<()> {
        *self.last_options.lock().unwrap() = Some(options);
        if self.fail_batch_write.load(Ordering::SeqCst) {
            return Err(BackupError::Store("batch write unavailable".to_string()));
        }
        self.store_records(project, records);
        Ok(())
    }

    async fn write_raw_records(&self, project: &str, records: &[FileRecord]) -> BackupResult<()> {
        self.raw_write_used.store(true, Ordering::SeqCst);
        self.store_records(project, records);
        Ok(())
    }

    async fn is_connected(&self, project: &str) -> bool {
        self.connected.lock().unwrap().contains(project)
    }

    async fn connect(&self, document_url: &DocumentUrl) -> BackupResult<()> {
        self.connected
            .lock()
            .unwrap()
            .insert(document_url.opaque_id().to_string());
        Ok(())
    }
}

// ── Project index fake ───────────────────────────────────────────

/// In-memory stand-in for the account's project index.
pub struct MemoryProjectIndex {
    projects: Mutex<BTreeMap<ProjectId, ProjectMetadata>>,
    account: AccountRecord,
    user_data: Option<UserData>,
    deleted: Mutex<Vec<ProjectId>>,
}

impl MemoryProjectIndex {
    pub fn new(account: AccountRecord) -> Self {
        Self {
            projects: Mutex::new(BTreeMap::new()),
            account,
            user_data: None,
            deleted: Mutex::new(Vec::new()),
        }
    }

    pub fn with_user_data(mut self, user_data: UserData) -> Self {
        self.user_data = Some(user_data);
        self
    }

    pub fn seed_project(&self, meta: ProjectMetadata) {
        self.projects.lock().unwrap().insert(meta.id, meta);
    }

    pub fn project(&self, id: &ProjectId) -> Option<ProjectMetadata> {
        self.projects.lock().unwrap().get(id).cloned()
    }

    pub fn all_projects(&self) -> Vec<ProjectMetadata> {
        self.projects.lock().unwrap().values().cloned().collect()
    }

    pub fn deleted_projects(&self) -> Vec<ProjectId> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProjectIndex for MemoryProjectIndex {
    async fn projects_for_user(&self, user: &AccountId) -> BackupResult<Vec<ProjectMetadata>> {
        Ok(self
            .projects
            .lock()
            .unwrap()
            .values()
            .filter(|p| &p.owner_id == user)
            .cloned()
            .collect())
    }

    async fn project_by_id(&self, id: &ProjectId) -> BackupResult<Option<ProjectMetadata>> {
        Ok(self.projects.lock().unwrap().get(id).cloned())
    }

    async fn insert_or_replace(&self, record: &ProjectMetadata) -> BackupResult<()> {
        self.projects
            .lock()
            .unwrap()
            .insert(record.id, record.clone());
        Ok(())
    }

    async fn delete_project_and_cleanup(&self, id: &ProjectId) -> BackupResult<()> {
        self.projects.lock().unwrap().remove(id);
        self.deleted.lock().unwrap().push(*id);
        Ok(())
    }

    async fn account_record(&self) -> BackupResult<Option<AccountRecord>> {
        Ok(Some(self.account.clone()))
    }

    async fn user_data(&self) -> BackupResult<Option<UserData>> {
        Ok(self.user_data.clone())
    }
}
