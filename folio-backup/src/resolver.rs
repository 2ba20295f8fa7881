//! Import discovery and conflict resolution.
//!
//! Discovery scans a bundle for projects that do not exist locally and is
//! purely advisory. The actual import runs per selected project with its
//! own error slot, so one bad project never aborts the rest of the batch.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use folio_types::{
    AccountId, Bundle, BundleSource, DocumentUrl, ImportableProject, ProjectData, ProjectId,
    ProjectMetadata,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{BackupError, BackupResult};
use crate::serializer::EntitySerializer;
use crate::stores::ProjectIndex;

/// What to do when a selected project already exists locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Leave the local project untouched.
    #[default]
    Skip,
    /// Delete the local project and replace it with the bundle's version,
    /// keeping the original id and document URL.
    Overwrite,
    /// Always import as a fresh project, conflicting or not: a new random
    /// id, a new document URL, and a name deduplicated against the projects
    /// already present.
    CreateNew,
}

/// The result for one selected project.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "result")]
pub enum ImportOutcome {
    /// The project now exists locally under these identifiers.
    Imported {
        project_id: ProjectId,
        document_url: DocumentUrl,
    },
    /// A conflicting local project was left untouched.
    Skipped,
    /// This project failed; the rest of the batch was unaffected.
    Failed { reason: String },
}

/// One selected project's id and name from the bundle, paired with how its
/// import went.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub project_id: ProjectId,
    pub name: String,
    pub outcome: ImportOutcome,
}

/// Per-project outcomes for one import batch, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub reports: Vec<ImportReport>,
}

impl ImportSummary {
    #[must_use]
    pub fn imported_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, ImportOutcome::Imported { .. }))
            .count()
    }

    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.outcome == ImportOutcome::Skipped)
            .count()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, ImportOutcome::Failed { .. }))
            .count()
    }
}

/// Resolves which bundle projects are importable and carries selected ones
/// into the local index and stores.
pub struct ImportResolver {
    index: Arc<dyn ProjectIndex>,
    serializer: EntitySerializer,
    account: AccountId,
}

impl ImportResolver {
    pub fn new(
        index: Arc<dyn ProjectIndex>,
        serializer: EntitySerializer,
        account: AccountId,
    ) -> Self {
        Self {
            index,
            serializer,
            account,
        }
    }

    /// Lists the bundle's projects that do not exist locally. Advisory: no
    /// mutation happens until a selection is imported.
    pub async fn discover(
        &self,
        bundle: &Bundle,
        source: BundleSource,
    ) -> BackupResult<Vec<ImportableProject>> {
        let local = self.index.projects_for_user(&self.account).await?;
        let local_ids: HashSet<ProjectId> = local.iter().map(|p| p.id).collect();

        let mut found = Vec::new();
        for meta in &bundle.projects {
            if local_ids.contains(&meta.id) {
                continue;
            }
            let (document_count, file_count) = bundle
                .project_data
                .get(&meta.id)
                .map(|d| (d.documents.len(), d.files.len()))
                .unwrap_or((0, 0));
            found.push(ImportableProject {
                metadata: meta.clone(),
                source,
                document_count,
                file_count,
            });
        }
        debug!(
            total = bundle.projects.len(),
            importable = found.len(),
            "scanned bundle for importable projects"
        );
        Ok(found)
    }

    /// Imports the selected projects from the bundle, one result slot per
    /// selection. A failure in one project is recorded in its slot and the
    /// batch continues.
    pub async fn import_projects(
        &self,
        bundle: &Bundle,
        selection: &[ProjectId],
        policy: ConflictPolicy,
    ) -> BackupResult<ImportSummary> {
        let local = self.index.projects_for_user(&self.account).await?;
        // Names already taken locally, plus names assigned earlier in this
        // batch, so two "Paper" imports land as "(imported)" and
        // "(imported 2)".
        let mut taken_names: HashSet<String> = local.iter().map(|p| p.name.clone()).collect();
        let local_ids: HashSet<ProjectId> = local.iter().map(|p| p.id).collect();

        let mut summary = ImportSummary::default();
        for id in selection {
            let Some(data) = bundle.project_data.get(id) else {
                summary.reports.push(ImportReport {
                    project_id: *id,
                    name: String::new(),
                    outcome: ImportOutcome::Failed {
                        reason: format!("project {id} not present in bundle"),
                    },
                });
                continue;
            };
            let name = data.metadata.name.clone();

            let outcome = self
                .import_one(data, local_ids.contains(id), policy, &mut taken_names)
                .await;
            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(project = %id, "import failed: {e}");
                    ImportOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            summary.reports.push(ImportReport {
                project_id: *id,
                name,
                outcome,
            });
        }

        info!(
            imported = summary.imported_count(),
            skipped = summary.skipped_count(),
            failed = summary.failed_count(),
            "import batch finished"
        );
        Ok(summary)
    }

    async fn import_one(
        &self,
        data: &ProjectData,
        conflicts: bool,
        policy: ConflictPolicy,
        taken_names: &mut HashSet<String>,
    ) -> BackupResult<ImportOutcome> {
        let mut meta = self.localized_metadata(&data.metadata);

        match policy {
            // Create-new is always a fresh create, whether or not anything
            // conflicts: new random id, new document URL, deduplicated name.
            ConflictPolicy::CreateNew => {
                meta.id = ProjectId::new();
                meta.document_url = data.metadata.document_url.reallocate();
                meta.name = unique_name(&data.metadata.name, taken_names);
            }
            ConflictPolicy::Skip if conflicts => {
                debug!(project = %meta.id, "conflicting project skipped");
                return Ok(ImportOutcome::Skipped);
            }
            ConflictPolicy::Overwrite if conflicts => {
                self.index.delete_project_and_cleanup(&meta.id).await?;
            }
            ConflictPolicy::Skip | ConflictPolicy::Overwrite => {}
        }

        taken_names.insert(meta.name.clone());
        self.index.insert_or_replace(&meta).await?;
        self.serializer.restore_project(data, &meta).await?;

        Ok(ImportOutcome::Imported {
            project_id: meta.id,
            document_url: meta.document_url.clone(),
        })
    }

    /// Pulls every matching bundle project back into the local index and
    /// stores, keeping ids and document URLs. Never deletes local projects
    /// that are absent from the bundle. Returns how many were reconciled.
    pub async fn reconcile_projects(
        &self,
        bundle: &Bundle,
        target: Option<ProjectId>,
    ) -> BackupResult<usize> {
        let mut count = 0;
        for meta in &bundle.projects {
            if let Some(target) = target {
                if meta.id != target {
                    continue;
                }
            }
            let Some(data) = bundle.project_data.get(&meta.id) else {
                continue;
            };
            let local_meta = self.localized_metadata(meta);
            self.index.insert_or_replace(&local_meta).await?;
            self.serializer.restore_project(data, &local_meta).await?;
            count += 1;
        }
        if let Some(target) = target {
            if count == 0 {
                return Err(BackupError::ProjectNotFound(target));
            }
        }
        Ok(count)
    }

    /// The bundle record adjusted for this local database: owned by the
    /// local account, with bundle-only stamps cleared.
    fn localized_metadata(&self, meta: &ProjectMetadata) -> ProjectMetadata {
        let mut meta = meta.clone();
        meta.owner_id = self.account;
        meta.exported_at = None;
        meta.updated_at = Utc::now();
        meta
    }
}

/// Picks a project name not already in `taken`: the desired name if free,
/// else "Name (imported)", then "Name (imported 2)" and up.
fn unique_name(desired: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(desired) {
        return desired.to_string();
    }
    let first = format!("{desired} (imported)");
    if !taken.contains(&first) {
        return first;
    }
    let mut n = 2u32;
    loop {
        let candidate = format!("{desired} (imported {n})");
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
