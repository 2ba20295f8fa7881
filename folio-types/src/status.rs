//! Backup status and import discovery records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ProjectMetadata;

/// The orchestrator's connection/operation state.
///
/// Transitions: `Disconnected → Idle` on storage access, `Idle → Syncing`
/// while an operation runs, back to `Idle` on success or `Error` on failure.
/// `Error` is not sticky: the next invocation proceeds as from `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupState {
    Disconnected,
    Idle,
    Syncing,
    Error,
}

/// A point-in-time view of the backup service, published to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupStatus {
    pub state: BackupState,
    /// When the last successful sync completed.
    pub last_sync: Option<DateTime<Utc>>,
    /// User preference gating automatic operations. Orthogonal to `state`.
    pub is_enabled: bool,
    /// Human-readable cause when `state` is [`BackupState::Error`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for BackupStatus {
    fn default() -> Self {
        Self {
            state: BackupState::Disconnected,
            last_sync: None,
            is_enabled: false,
            error: None,
        }
    }
}

/// Where a bundle being scanned or imported came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleSource {
    /// The currently connected backup destination.
    Backup,
    /// An in-memory zip archive.
    Archive,
    /// A user-picked directory.
    Directory,
}

/// A project discovered in a bundle but absent locally.
///
/// Advisory only; producing this record triggers no mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportableProject {
    #[serde(flatten)]
    pub metadata: ProjectMetadata,
    pub source: BundleSource,
    /// Number of documents the bundle carries for this project.
    pub document_count: usize,
    /// Number of files the bundle carries for this project.
    pub file_count: usize,
}
