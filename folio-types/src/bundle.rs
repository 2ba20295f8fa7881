//! The transient in-memory bundle assembled for every backup/export/import.
//!
//! A [`Bundle`] is never persisted as a single object; only its parts are,
//! under the unified format layout owned by `folio-format`.

use std::collections::BTreeMap;

use crate::{
    AccountRecord, DocumentId, DocumentMetadata, FileMetadata, Manifest, ProjectId,
    ProjectMetadata, UserData,
};

/// Content of one file as it travels through the engine.
///
/// Whether a path holds text or bytes is decided by the storage adapter's
/// filename classifier, never by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Text(String),
    Binary(Vec<u8>),
}

impl FileContent {
    /// Returns the content length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Text(s) => s.len(),
            Self::Binary(b) => b.len(),
        }
    }

    /// Returns true if the content is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the raw bytes of the content.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(s) => s.as_bytes(),
            Self::Binary(b) => b,
        }
    }
}

/// Captured content for one document: the full-state CRDT snapshot and a
/// best-effort plain-text rendering. Either may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentContent {
    pub snapshot: Option<Vec<u8>>,
    pub readable_text: Option<String>,
}

/// Everything captured for one project.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectData {
    pub metadata: ProjectMetadata,
    pub documents: Vec<DocumentMetadata>,
    /// Document contents keyed by document id.
    pub document_contents: BTreeMap<DocumentId, DocumentContent>,
    pub files: Vec<FileMetadata>,
    /// File contents keyed by normalized project-relative path.
    pub file_contents: BTreeMap<String, FileContent>,
}

impl ProjectData {
    /// Creates project data with metadata only and no captured content.
    #[must_use]
    pub fn new(metadata: ProjectMetadata) -> Self {
        Self {
            metadata,
            documents: Vec::new(),
            document_contents: BTreeMap::new(),
            files: Vec::new(),
            file_contents: BTreeMap::new(),
        }
    }
}

/// The complete in-memory representation of a backup/export payload.
///
/// Built fresh for every operation, laid out via the unified format codec,
/// and dropped once the operation completes.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    pub manifest: Manifest,
    pub account: Option<AccountRecord>,
    pub user_data: Option<UserData>,
    /// The project index, in the order it serializes to `projects.json`.
    pub projects: Vec<ProjectMetadata>,
    /// Per-project captured data keyed by project id.
    pub project_data: BTreeMap<ProjectId, ProjectData>,
}

impl Bundle {
    /// Creates an empty bundle with the given manifest.
    #[must_use]
    pub fn new(manifest: Manifest) -> Self {
        Self {
            manifest,
            account: None,
            user_data: None,
            projects: Vec::new(),
            project_data: BTreeMap::new(),
        }
    }

    /// Adds a project and its captured data, replacing any entry with the
    /// same id.
    pub fn insert_project(&mut self, data: ProjectData) {
        let meta = data.metadata.clone();
        if let Some(existing) = self.projects.iter_mut().find(|p| p.id == meta.id) {
            *existing = meta.clone();
        } else {
            self.projects.push(meta.clone());
        }
        self.project_data.insert(meta.id, data);
    }

    /// Removes a project and its data by id.
    pub fn remove_project(&mut self, id: &ProjectId) -> Option<ProjectData> {
        self.projects.retain(|p| &p.id != id);
        self.project_data.remove(id)
    }

    /// Looks up a project's metadata by the opaque id of its document URL.
    /// Used by the merge step, which keys on document URL rather than
    /// project id since ids differ across local databases.
    #[must_use]
    pub fn project_by_opaque_id(&self, opaque_id: &str) -> Option<&ProjectMetadata> {
        self.projects
            .iter()
            .find(|p| p.document_url.opaque_id() == opaque_id)
    }
}
