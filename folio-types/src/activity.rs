//! Append-only backup activity log, capped to the most recent entries.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of activity entries retained.
pub const ACTIVITY_LOG_CAP: usize = 50;

/// What an activity entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityKind {
    BackupStart,
    BackupComplete,
    BackupError,
    ImportStart,
    ImportComplete,
    ImportError,
}

impl ActivityKind {
    /// Returns true for the two error kinds.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::BackupError | Self::ImportError)
    }
}

/// One append-only log entry. Independent of the status state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupActivity {
    /// Monotonically increasing within one service instance.
    pub id: u64,
    pub kind: ActivityKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// The capped activity buffer owned by the backup service.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    entries: VecDeque<BackupActivity>,
    next_id: u64,
}

impl ActivityLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry, evicting the oldest once the cap is reached.
    /// Returns the entry as recorded (with its assigned id).
    pub fn push(&mut self, kind: ActivityKind, message: impl Into<String>) -> BackupActivity {
        let entry = BackupActivity {
            id: self.next_id,
            kind,
            message: message.into(),
            timestamp: Utc::now(),
        };
        self.next_id += 1;
        self.entries.push_back(entry.clone());
        while self.entries.len() > ACTIVITY_LOG_CAP {
            self.entries.pop_front();
        }
        entry
    }

    /// Returns the retained entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<BackupActivity> {
        self.entries.iter().cloned().collect()
    }

    /// Returns the number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
