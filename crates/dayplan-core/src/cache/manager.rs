use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::schema::decode_records;
use super::store::{FileStore, KeyValueStore};
use crate::models::{Collection, Collections, Note, Record, Task, TimetableEntry};
use crate::sync::SyncState;

/// Key prefix for the persisted dirty flag.
const DIRTY_KEY: &str = "isDirty";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }
}

/// Human-readable age of a local save, e.g. "5m ago".
pub fn age_display(cached_at: DateTime<Utc>) -> String {
    let minutes = (Utc::now() - cached_at).num_minutes();
    if minutes < 1 {
        // Also covers clock skew
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        if minutes % 60 >= 30 {
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        if (minutes % 1440) / 60 >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}

/// Everything persisted locally for one identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub collections: Collections,
    pub state: SyncState,
    /// Time of the oldest collection write in this snapshot.
    pub cached_at: DateTime<Utc>,
}

/// Identity-scoped local persistence of the three collections and the
/// dirty flag. Keys are `<collection>_<identity>` and `isDirty_<identity>`.
#[derive(Clone)]
pub struct LocalCache {
    store: Arc<dyn KeyValueStore>,
}

impl LocalCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Open a file-backed cache in `cache_dir`
    pub fn open(cache_dir: PathBuf) -> Result<Self> {
        Ok(Self::new(Arc::new(FileStore::new(cache_dir)?)))
    }

    fn collection_key(collection: Collection, identity: &str) -> String {
        format!("{}_{}", collection.key(), identity)
    }

    fn dirty_key(identity: &str) -> String {
        format!("{}_{}", DIRTY_KEY, identity)
    }

    fn load_collection<R: Record>(&self, identity: &str) -> Result<Option<CachedData<Vec<R>>>> {
        let name = R::COLLECTION;
        let Some(contents) = self.store.get_item(&Self::collection_key(name, identity))? else {
            return Ok(None);
        };

        let raw: CachedData<Vec<Value>> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache entry: {}", name))?;
        let records = decode_records::<R>(raw.data)
            .with_context(|| format!("Failed to decode cached {}", name))?;

        Ok(Some(CachedData {
            data: records,
            cached_at: raw.cached_at,
        }))
    }

    /// Persist one full collection, replacing what was stored before
    pub fn save<R: Record>(&self, identity: &str, records: &[R]) -> Result<()> {
        let name = R::COLLECTION;
        let cached = CachedData::new(records);
        let contents = serde_json::to_string(&cached)?;
        self.store
            .set_item(&Self::collection_key(name, identity), &contents)
            .with_context(|| format!("Failed to save cached {}", name))?;
        debug!(user = identity, collection = %name, count = records.len(), "Saved collection to local cache");
        Ok(())
    }

    pub fn save_all(&self, identity: &str, collections: &Collections) -> Result<()> {
        self.save(identity, &collections.tasks)?;
        self.save(identity, &collections.timetable)?;
        self.save(identity, &collections.notes)
    }

    pub fn load_sync_state(&self, identity: &str) -> Result<SyncState> {
        match self.store.get_item(&Self::dirty_key(identity))? {
            Some(contents) => {
                let is_dirty: bool = serde_json::from_str(&contents)
                    .context("Failed to parse cached dirty flag")?;
                Ok(SyncState { is_dirty })
            }
            None => Ok(SyncState::default()),
        }
    }

    pub fn save_sync_state(&self, identity: &str, state: &SyncState) -> Result<()> {
        let contents = serde_json::to_string(&state.is_dirty)?;
        self.store
            .set_item(&Self::dirty_key(identity), &contents)
            .context("Failed to save dirty flag")
    }

    /// Load the full local snapshot for `identity`.
    ///
    /// Returns `None` unless all three collections are present, so callers can
    /// tell "nothing cached" apart from "cached but empty".
    pub fn load(&self, identity: &str) -> Result<Option<Snapshot>> {
        let tasks = self.load_collection::<Task>(identity)?;
        let timetable = self.load_collection::<TimetableEntry>(identity)?;
        let notes = self.load_collection::<Note>(identity)?;

        let (Some(tasks), Some(timetable), Some(notes)) = (tasks, timetable, notes) else {
            debug!(user = identity, "No complete local snapshot");
            return Ok(None);
        };

        let cached_at = tasks
            .cached_at
            .min(timetable.cached_at)
            .min(notes.cached_at);

        Ok(Some(Snapshot {
            collections: Collections {
                tasks: tasks.data,
                timetable: timetable.data,
                notes: notes.data,
            },
            state: self.load_sync_state(identity)?,
            cached_at,
        }))
    }

    /// Remove every entry stored for `identity`
    pub fn clear(&self, identity: &str) -> Result<()> {
        for collection in Collection::ALL {
            self.store
                .remove_item(&Self::collection_key(collection, identity))?;
        }
        self.store.remove_item(&Self::dirty_key(identity))
    }
}
