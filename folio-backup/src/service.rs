//! The backup service: the orchestrator every UI surface talks to.
//!
//! Owns the connection to one storage destination, the status state machine
//! published over a watch channel, and the capped activity log. Every
//! destination-touching operation runs under a single in-flight guard, so
//! concurrent triggers (a manual sync racing the auto-sync listener) are
//! serialized rather than interleaved.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use folio_format::{
    read_unified_structure, validate_bundle, write_files_only, write_unified_structure,
    ExportFormat,
};
use folio_storage::{ArchiveAdapter, DirectoryAdapter, StorageBackend};
use folio_types::{
    ActivityKind, ActivityLog, BackupActivity, BackupState, BackupStatus, Bundle, BundleMode,
    BundleSource, ImportableProject, Manifest, ProjectId,
};
use tokio::sync::{broadcast, mpsc, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{BackupError, BackupResult};
use crate::resolver::{ConflictPolicy, ImportResolver, ImportSummary};
use crate::serializer::{EntitySerializer, DEFAULT_SYNC_WAIT};
use crate::stores::{DocumentStore, FileStore, ProjectIndex};

/// Tunables for the backup service.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    /// Bounded wait for each document store to sync before capture.
    pub document_sync_wait: Duration,
    /// Whether soft-deleted files are carried into bundles.
    pub include_soft_deleted: bool,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            document_sync_wait: DEFAULT_SYNC_WAIT,
            include_soft_deleted: false,
        }
    }
}

/// Workspace changes the auto-sync listener reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceEvent {
    ProjectCreated(ProjectId),
    ProjectUpdated(ProjectId),
    ProjectDeleted(ProjectId),
}

/// Where a bundle for scanning or importing comes from.
#[derive(Debug, Clone)]
pub enum BundleInput {
    /// The currently connected backup destination.
    Backup,
    /// Raw bytes of a zip archive.
    ZipArchive(Vec<u8>),
    /// A directory on the local filesystem.
    Directory(PathBuf),
}

/// The backup orchestrator.
///
/// Construct once per account, connect a destination, then drive it from UI
/// commands and (optionally) a workspace event stream via
/// [`BackupService::spawn_event_listener`].
pub struct BackupService {
    config: BackupConfig,
    account: folio_types::AccountId,
    serializer: EntitySerializer,
    index: Arc<dyn ProjectIndex>,
    resolver: ImportResolver,
    backend: Arc<RwLock<Option<StorageBackend>>>,
    status_tx: watch::Sender<BackupStatus>,
    activity: RwLock<ActivityLog>,
    activity_tx: broadcast::Sender<BackupActivity>,
    /// Serializes destination-touching operations.
    op_guard: Mutex<()>,
}

impl BackupService {
    pub fn new(
        config: BackupConfig,
        account: folio_types::AccountId,
        documents: Arc<dyn DocumentStore>,
        files: Arc<dyn FileStore>,
        index: Arc<dyn ProjectIndex>,
    ) -> Self {
        let serializer =
            EntitySerializer::new(documents, files).with_sync_wait(config.document_sync_wait);
        let resolver = ImportResolver::new(Arc::clone(&index), serializer.clone(), account);
        let (status_tx, _) = watch::channel(BackupStatus::default());
        let (activity_tx, _) = broadcast::channel(64);

        Self {
            config,
            account,
            serializer,
            index,
            resolver,
            backend: Arc::new(RwLock::new(None)),
            status_tx,
            activity: RwLock::new(ActivityLog::new()),
            activity_tx,
            op_guard: Mutex::new(()),
        }
    }

    // ── Connection and preferences ───────────────────────────────────

    /// Connects a storage destination. Returns false (leaving the previous
    /// destination untouched) when access to it cannot be established.
    pub async fn request_storage_access(&self, backend: StorageBackend) -> bool {
        // Probe the destination before committing to it. Absence of a
        // manifest is fine (fresh destination); an access error is not.
        if let Err(e) = backend.exists(folio_format::manifest_path()).await {
            warn!(kind = backend.kind(), "storage destination rejected: {e}");
            return false;
        }
        info!(kind = backend.kind(), "storage destination connected");
        *self.backend.write().await = Some(backend);
        self.status_tx.send_modify(|s| {
            s.state = BackupState::Idle;
            s.error = None;
        });
        true
    }

    /// Replaces the current destination with a new one.
    pub async fn change_storage_target(&self, backend: StorageBackend) -> bool {
        self.request_storage_access(backend).await
    }

    /// Drops the destination. Status returns to disconnected; the enabled
    /// preference is left as-is.
    pub async fn disconnect(&self) {
        *self.backend.write().await = None;
        self.status_tx.send_modify(|s| {
            s.state = BackupState::Disconnected;
            s.error = None;
        });
        info!("storage destination disconnected");
    }

    /// Sets the user preference gating automatic operations.
    pub fn set_enabled(&self, enabled: bool) {
        self.status_tx.send_modify(|s| s.is_enabled = enabled);
    }

    /// The current status snapshot.
    #[must_use]
    pub fn status(&self) -> BackupStatus {
        self.status_tx.borrow().clone()
    }

    /// Subscribes to status changes.
    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<BackupStatus> {
        self.status_tx.subscribe()
    }

    /// The retained activity entries, oldest first.
    pub async fn activity(&self) -> Vec<BackupActivity> {
        self.activity.read().await.entries()
    }

    /// Subscribes to activity entries as they are recorded.
    #[must_use]
    pub fn subscribe_activity(&self) -> broadcast::Receiver<BackupActivity> {
        self.activity_tx.subscribe()
    }

    // ── Destination operations ───────────────────────────────────────

    /// Captures the given project (or all of the account's projects) and
    /// merges them into the destination bundle.
    pub async fn synchronize(&self, project: Option<ProjectId>) -> BackupResult<()> {
        self.ensure_active(ActivityKind::BackupError).await?;
        let _guard = self.op_guard.lock().await;

        self.begin(ActivityKind::BackupStart, describe_scope("backup", project))
            .await;
        let result = self
            .run_backup(project, BundleMode::Backup, ExportFormat::Unified)
            .await;
        self.finish(
            result,
            true,
            ActivityKind::BackupComplete,
            ActivityKind::BackupError,
            "backup complete",
        )
        .await
    }

    /// Writes an explicit export of the given project (or all projects) to
    /// the destination in the chosen layout.
    pub async fn export_to_storage(
        &self,
        project: Option<ProjectId>,
        format: ExportFormat,
    ) -> BackupResult<()> {
        self.ensure_active(ActivityKind::BackupError).await?;
        let _guard = self.op_guard.lock().await;

        self.begin(ActivityKind::BackupStart, describe_scope("export", project))
            .await;
        let result = self.run_backup(project, BundleMode::Export, format).await;
        self.finish(
            result,
            false,
            ActivityKind::BackupComplete,
            ActivityKind::BackupError,
            "export complete",
        )
        .await
    }

    /// Exports the given project (or all projects) into an in-memory zip
    /// archive and returns its bytes. Needs no connected destination.
    pub async fn export_archive(
        &self,
        project: Option<ProjectId>,
        format: ExportFormat,
    ) -> BackupResult<Vec<u8>> {
        let _guard = self.op_guard.lock().await;

        self.begin(ActivityKind::BackupStart, describe_scope("archive export", project))
            .await;
        let result = self.build_archive(project, format).await;
        self.finish(
            result,
            false,
            ActivityKind::BackupComplete,
            ActivityKind::BackupError,
            "archive export complete",
        )
        .await
    }

    /// Pulls changes from the destination bundle back into the local stores,
    /// for the given project (or every project the bundle carries). Returns
    /// how many projects were reconciled.
    pub async fn import_changes(&self, project: Option<ProjectId>) -> BackupResult<usize> {
        self.ensure_active(ActivityKind::ImportError).await?;
        let _guard = self.op_guard.lock().await;

        self.begin(ActivityKind::ImportStart, describe_scope("import", project))
            .await;
        let result = self.run_import(project).await;
        self.finish(
            result,
            true,
            ActivityKind::ImportComplete,
            ActivityKind::ImportError,
            "import complete",
        )
        .await
    }

    // ── Import from arbitrary sources ────────────────────────────────

    /// Scans a bundle for projects that do not exist locally. Advisory:
    /// nothing is mutated.
    pub async fn scan_for_importable_projects(
        &self,
        input: BundleInput,
    ) -> BackupResult<Vec<ImportableProject>> {
        let (bundle, source) = self.resolve_bundle(input).await?;
        validate_bundle(&bundle)?;
        self.resolver.discover(&bundle, source).await
    }

    /// Imports the selected projects from a bundle under the given conflict
    /// policy. One result slot per selection; a failed project never aborts
    /// the rest. Validation happens before any local mutation.
    pub async fn import_selected(
        &self,
        input: BundleInput,
        selection: &[ProjectId],
        policy: ConflictPolicy,
    ) -> BackupResult<ImportSummary> {
        let _guard = self.op_guard.lock().await;

        self.begin(
            ActivityKind::ImportStart,
            format!("importing {} selected project(s)", selection.len()),
        )
        .await;
        let result = async {
            let (bundle, _) = self.resolve_bundle(input).await?;
            validate_bundle(&bundle)?;
            self.resolver.import_projects(&bundle, selection, policy).await
        }
        .await;
        self.finish(
            result,
            false,
            ActivityKind::ImportComplete,
            ActivityKind::ImportError,
            "selected import complete",
        )
        .await
    }

    /// Returns the destination's current content as zip bytes. Only valid
    /// for an archive destination.
    pub async fn archive_bytes(&self) -> BackupResult<Vec<u8>> {
        let backend = self.backend.read().await;
        match backend.as_ref() {
            Some(StorageBackend::Archive(adapter)) => {
                adapter.clone().into_zip_bytes().map_err(BackupError::Access)
            }
            Some(_) => Err(BackupError::Store(
                "connected destination is not an archive".into(),
            )),
            None => Err(BackupError::NotConnected),
        }
    }

    // ── Auto-sync ────────────────────────────────────────────────────

    /// Spawns a task that turns workspace events into best-effort syncs.
    /// Failures land in the activity log only; the task never aborts.
    pub fn spawn_event_listener(
        self: &Arc<Self>,
        mut events: mpsc::UnboundedReceiver<WorkspaceEvent>,
    ) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if !service.is_active().await {
                    debug!(?event, "auto-sync skipped, backup inactive");
                    continue;
                }
                let scope = match event {
                    WorkspaceEvent::ProjectCreated(id) | WorkspaceEvent::ProjectUpdated(id) => {
                        Some(id)
                    }
                    // The full pass refreshes the index without the deleted
                    // project; its captured data stays in the bundle.
                    WorkspaceEvent::ProjectDeleted(_) => None,
                };
                if let Err(e) = service.synchronize(scope).await {
                    warn!(?event, "auto-sync failed: {e}");
                }
            }
        })
    }

    // ── Internals ────────────────────────────────────────────────────

    async fn is_active(&self) -> bool {
        let enabled = self.status_tx.borrow().is_enabled;
        enabled && self.backend.read().await.is_some()
    }

    /// Rejects an operation when backup is disabled or disconnected. The
    /// rejection is recorded in the activity log but never moves the status
    /// state machine.
    async fn ensure_active(&self, error_kind: ActivityKind) -> BackupResult<()> {
        if !self.status_tx.borrow().is_enabled {
            self.record(error_kind, "operation rejected: backup is disabled")
                .await;
            return Err(BackupError::Disabled);
        }
        if self.backend.read().await.is_none() {
            self.record(error_kind, "operation rejected: no destination connected")
                .await;
            return Err(BackupError::NotConnected);
        }
        Ok(())
    }

    async fn begin(&self, kind: ActivityKind, message: impl Into<String>) {
        // Operations that need no destination (archive export, zip or
        // directory import) can run while disconnected; the state machine
        // leaves `Disconnected` only through `request_storage_access`.
        let connected = self.backend.read().await.is_some();
        self.status_tx.send_modify(|s| {
            if connected {
                s.state = BackupState::Syncing;
            }
            s.error = None;
        });
        self.record(kind, message).await;
    }

    async fn finish<T>(
        &self,
        result: BackupResult<T>,
        stamp_last_sync: bool,
        ok_kind: ActivityKind,
        err_kind: ActivityKind,
        ok_message: &str,
    ) -> BackupResult<T> {
        let connected = self.backend.read().await.is_some();
        match &result {
            Ok(_) => {
                self.status_tx.send_modify(|s| {
                    s.state = if connected {
                        BackupState::Idle
                    } else {
                        BackupState::Disconnected
                    };
                    s.error = None;
                    if stamp_last_sync {
                        s.last_sync = Some(Utc::now());
                    }
                });
                self.record(ok_kind, ok_message).await;
            }
            Err(e) => {
                let message = e.to_string();
                self.status_tx.send_modify(|s| {
                    if connected {
                        s.state = BackupState::Error;
                        s.error = Some(message.clone());
                    } else {
                        // While disconnected the failure lives in the
                        // activity log only.
                        s.state = BackupState::Disconnected;
                        s.error = None;
                    }
                });
                self.record(err_kind, message).await;
            }
        }
        result
    }

    async fn record(&self, kind: ActivityKind, message: impl Into<String>) {
        let entry = self.activity.write().await.push(kind, message);
        let _ = self.activity_tx.send(entry);
    }

    /// Captures the targeted projects and merges them into the destination.
    ///
    /// The merge is keyed by each project's document URL opaque id, never by
    /// project id: a captured project replaces the destination entry sharing
    /// its opaque id even when their local ids differ, and destination
    /// projects outside the target set stay untouched.
    async fn run_backup(
        &self,
        target: Option<ProjectId>,
        mode: BundleMode,
        format: ExportFormat,
    ) -> BackupResult<()> {
        let mut backend = self.backend.write().await;
        let backend = backend.as_mut().ok_or(BackupError::NotConnected)?;

        let mut bundle = match format {
            // A files-only export never merges with what is already there.
            ExportFormat::FilesOnly => Bundle::new(Manifest::new(mode)),
            ExportFormat::Unified => match read_unified_structure(backend).await {
                Ok(existing) => existing,
                Err(folio_format::FormatError::NoBackupFound) => {
                    debug!("no existing bundle at destination, starting fresh");
                    Bundle::new(Manifest::new(mode))
                }
                Err(e) => return Err(e.into()),
            },
        };
        bundle.manifest = Manifest::new(mode);
        bundle.account = self.index.account_record().await?;
        bundle.user_data = self.index.user_data().await?;

        let targets = self.resolve_targets(target).await?;
        info!(mode = ?mode, targets = targets.len(), "capturing projects");

        let now = Utc::now();
        for mut meta in targets {
            meta.last_sync = Some(now);
            if mode == BundleMode::Export {
                meta.exported_at = Some(now);
            }
            let captured = self
                .serializer
                .capture_project(&meta, self.config.include_soft_deleted)
                .await?;

            // Same remote project under a different local id: the fresh
            // capture supersedes the stale entry.
            let stale = bundle
                .project_by_opaque_id(meta.document_url.opaque_id())
                .filter(|existing| existing.id != meta.id)
                .map(|existing| existing.id);
            if let Some(stale) = stale {
                bundle.remove_project(&stale);
            }
            bundle.insert_project(captured);
        }

        match format {
            ExportFormat::Unified => write_unified_structure(backend, &bundle).await?,
            ExportFormat::FilesOnly => write_files_only(backend, &bundle).await?,
        }
        Ok(())
    }

    async fn build_archive(
        &self,
        target: Option<ProjectId>,
        format: ExportFormat,
    ) -> BackupResult<Vec<u8>> {
        let mut backend = StorageBackend::Archive(ArchiveAdapter::new());
        let mut bundle = Bundle::new(Manifest::new(BundleMode::Export));
        bundle.account = self.index.account_record().await?;
        bundle.user_data = self.index.user_data().await?;

        let now = Utc::now();
        for mut meta in self.resolve_targets(target).await? {
            meta.exported_at = Some(now);
            let captured = self
                .serializer
                .capture_project(&meta, self.config.include_soft_deleted)
                .await?;
            bundle.insert_project(captured);
        }

        match format {
            ExportFormat::Unified => write_unified_structure(&mut backend, &bundle).await?,
            ExportFormat::FilesOnly => write_files_only(&mut backend, &bundle).await?,
        }
        match backend {
            StorageBackend::Archive(adapter) => {
                adapter.into_zip_bytes().map_err(BackupError::Access)
            }
            StorageBackend::Directory(_) => unreachable!("archive backend constructed above"),
        }
    }

    async fn run_import(&self, target: Option<ProjectId>) -> BackupResult<usize> {
        let bundle = {
            let backend = self.backend.read().await;
            let backend = backend.as_ref().ok_or(BackupError::NotConnected)?;
            read_unified_structure(backend).await?
        };
        validate_bundle(&bundle)?;
        self.resolver.reconcile_projects(&bundle, target).await
    }

    async fn resolve_targets(
        &self,
        target: Option<ProjectId>,
    ) -> BackupResult<Vec<folio_types::ProjectMetadata>> {
        match target {
            Some(id) => {
                let meta = self
                    .index
                    .project_by_id(&id)
                    .await?
                    .ok_or(BackupError::ProjectNotFound(id))?;
                Ok(vec![meta])
            }
            None => self.index.projects_for_user(&self.account).await,
        }
    }

    async fn resolve_bundle(&self, input: BundleInput) -> BackupResult<(Bundle, BundleSource)> {
        match input {
            BundleInput::Backup => {
                let backend = self.backend.read().await;
                let backend = backend.as_ref().ok_or(BackupError::NotConnected)?;
                let bundle = read_unified_structure(backend).await?;
                Ok((bundle, BundleSource::Backup))
            }
            BundleInput::ZipArchive(bytes) => {
                let adapter = ArchiveAdapter::from_zip_bytes(&bytes).map_err(BackupError::Access)?;
                let backend = StorageBackend::Archive(adapter);
                let bundle = read_unified_structure(&backend).await?;
                Ok((bundle, BundleSource::Archive))
            }
            BundleInput::Directory(path) => {
                let adapter = DirectoryAdapter::open(&path)
                    .await
                    .map_err(BackupError::Access)?;
                let backend = StorageBackend::Directory(adapter);
                let bundle = read_unified_structure(&backend).await?;
                Ok((bundle, BundleSource::Directory))
            }
        }
    }
}

fn describe_scope(operation: &str, project: Option<ProjectId>) -> String {
    match project {
        Some(id) => format!("{operation} of project {id}"),
        None => format!("{operation} of all projects"),
    }
}
