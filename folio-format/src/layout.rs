//! Canonical path layout of the unified format.

use folio_types::{DocumentId, ProjectId};

pub(crate) const MANIFEST: &str = "manifest.json";
pub(crate) const ACCOUNT: &str = "account.json";
pub(crate) const USER_DATA: &str = "userdata.json";
pub(crate) const PROJECT_INDEX: &str = "projects.json";
pub(crate) const PROJECTS_DIR: &str = "projects";
pub(crate) const METADATA: &str = "metadata.json";
pub(crate) const SNAPSHOT_EXT: &str = "snapshot";

/// Path of the bundle manifest.
#[must_use]
pub fn manifest_path() -> &'static str {
    MANIFEST
}

/// Path of the optional account record.
#[must_use]
pub fn account_path() -> &'static str {
    ACCOUNT
}

/// Path of the optional user-data blob.
#[must_use]
pub fn user_data_path() -> &'static str {
    USER_DATA
}

/// Path of the project index.
#[must_use]
pub fn project_index_path() -> &'static str {
    PROJECT_INDEX
}

/// Root directory of one project's subtree.
#[must_use]
pub fn project_dir(id: &ProjectId) -> String {
    format!("{PROJECTS_DIR}/{id}")
}

/// A project's documents subtree.
#[must_use]
pub fn project_documents_dir(id: &ProjectId) -> String {
    format!("{PROJECTS_DIR}/{id}/documents")
}

/// A project's files subtree.
#[must_use]
pub fn project_files_dir(id: &ProjectId) -> String {
    format!("{PROJECTS_DIR}/{id}/files")
}

pub(crate) fn project_metadata_path(id: &ProjectId) -> String {
    format!("{}/{METADATA}", project_dir(id))
}

pub(crate) fn document_index_path(id: &ProjectId) -> String {
    format!("{}/{METADATA}", project_documents_dir(id))
}

pub(crate) fn document_snapshot_path(project: &ProjectId, doc: &DocumentId) -> String {
    format!("{}/{doc}.{SNAPSHOT_EXT}", project_documents_dir(project))
}

pub(crate) fn document_text_path(project: &ProjectId, doc: &DocumentId) -> String {
    format!("{}/{doc}.txt", project_documents_dir(project))
}

pub(crate) fn file_index_path(id: &ProjectId) -> String {
    format!("{}/{METADATA}", project_files_dir(id))
}

pub(crate) fn file_content_path(id: &ProjectId, relative: &str) -> String {
    format!("{}/{}", project_files_dir(id), relative.trim_start_matches('/'))
}
