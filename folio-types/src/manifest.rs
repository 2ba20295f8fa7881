//! The bundle manifest, the small versioned header identifying a bundle's
//! schema and the mode it was written in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current unified format version. Checked before trusting the layout of a
/// bundle read from storage; future layout changes bump this.
pub const FORMAT_VERSION: &str = "1.0";

/// The operation that produced (or is consuming) a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleMode {
    /// Automatic or manual backup to a connected destination.
    Backup,
    /// Explicit user-driven export.
    Export,
    /// A bundle being read for import.
    Import,
}

/// The versioned header at the root of every bundle.
///
/// Invariant: every bundle has exactly one manifest, and its `version` must
/// be checked before trusting the rest of the layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Format version string; non-empty.
    pub version: String,
    /// When the bundle was last written.
    #[serde(rename = "lastSyncTimestamp")]
    pub last_sync_timestamp: DateTime<Utc>,
    /// The operation that produced the bundle.
    pub mode: BundleMode,
}

impl Manifest {
    /// Creates a manifest for the current format version, stamped now.
    #[must_use]
    pub fn new(mode: BundleMode) -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            last_sync_timestamp: Utc::now(),
            mode,
        }
    }
}
