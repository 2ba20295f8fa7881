//! Backup reconciliation engine for Folio.
//!
//! Captures a workspace's projects (CRDT document snapshots, file trees,
//! account and settings) into the unified bundle format, merges them into a
//! connected storage destination, and selectively imports projects back out
//! of bundles with conflict resolution.
//!
//! The engine talks to the rest of the application through three injected
//! store traits ([`DocumentStore`], [`FileStore`], [`ProjectIndex`]) and to
//! the destination through [`folio_storage::StorageBackend`]; it never knows
//! which CRDT engine or which kind of storage is underneath.

mod error;
mod resolver;
mod serializer;
mod service;
mod stores;

pub use error::{BackupError, BackupResult};
pub use resolver::{ConflictPolicy, ImportOutcome, ImportReport, ImportResolver, ImportSummary};
pub use serializer::{EntitySerializer, DEFAULT_SYNC_WAIT};
pub use service::{BackupConfig, BackupService, BundleInput, WorkspaceEvent};
pub use stores::{
    DocumentStore, FileRecord, FileStore, ProjectDisplay, ProjectIndex, WriteOptions,
};
