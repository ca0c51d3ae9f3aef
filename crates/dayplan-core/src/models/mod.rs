//! Data models for dayplan records.
//!
//! This module contains the three record collections a user owns:
//!
//! - `Task`: to-do items with priority, deadline and completion state
//! - `TimetableEntry`: daily schedule slots (`HH:MM` start/end)
//! - `Note`: free-form notes stamped with their creation time
//!
//! Each record type implements [`Record`], which names its collection and
//! lists the fields stored as timestamps so the cache and remote codecs can
//! revive them uniformly.

pub mod note;
pub mod task;
pub mod timetable;
pub mod validation;

use serde::{de::DeserializeOwned, Serialize};

pub use note::{Note, NoteDraft};
pub use task::{Priority, Task, TaskDraft};
pub use timetable::{EntryDraft, TimetableEntry};
pub use validation::{Validate, ValidationError};

/// The record collections kept per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Tasks,
    Timetable,
    Notes,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Tasks, Collection::Timetable, Collection::Notes];

    /// Key segment used both for local cache keys and remote paths
    pub fn key(&self) -> &'static str {
        match self {
            Collection::Tasks => "tasks",
            Collection::Timetable => "timetable",
            Collection::Notes => "notes",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// A record stored in one of the user's collections.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: Collection;

    /// Serialized field names holding timestamps.
    const TIMESTAMP_FIELDS: &'static [&'static str];

    fn id(&self) -> &str;
}

/// The three collections of one user, as held in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collections {
    pub tasks: Vec<Task>,
    pub timetable: Vec<TimetableEntry>,
    pub notes: Vec<Note>,
}

impl Collections {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.timetable.is_empty() && self.notes.is_empty()
    }
}

/// Generate a fresh record id. Writes are local-first, so ids are never
/// assigned by the server.
pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
