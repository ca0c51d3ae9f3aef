use serde::{Deserialize, Serialize};

/// Whether in-memory collections may differ from the last known remote
/// snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    pub is_dirty: bool,
}

impl SyncState {
    /// Label for the sync control
    pub fn label(&self) -> &'static str {
        if self.is_dirty {
            "Sync Now"
        } else {
            "Synced"
        }
    }
}

/// How an identity attach was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    /// A complete local snapshot was found; no network access happened
    LoadedLocal,
    /// No local snapshot; collections were pulled from the remote store
    PulledRemote,
    /// The identity was already attached
    Unchanged,
    /// No identity; collections were cleared
    Detached,
}

/// Record counts written by a completed push.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub tasks: usize,
    pub timetable: usize,
    pub notes: usize,
}

impl SyncReport {
    pub fn total(&self) -> usize {
        self.tasks + self.timetable + self.notes
    }
}
