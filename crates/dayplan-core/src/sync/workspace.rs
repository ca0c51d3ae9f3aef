use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{AttachOutcome, SyncReport, SyncState};
use crate::ai::{AiError, Assistant, TaskSuggestion};
use crate::cache::{age_display, LocalCache};
use crate::models::{
    self, new_record_id, Collections, EntryDraft, Note, NoteDraft, Record, Task, TaskDraft,
    TimetableEntry, Validate, ValidationError,
};
use crate::remote::{partition_path, records_to_tree, tree_to_records, RemoteStore, StorageError};

/// Access to the in-memory vector holding a record type.
trait Slot: Record {
    fn slot(data: &Collections) -> &Vec<Self>;
    fn slot_mut(data: &mut Collections) -> &mut Vec<Self>;
}

impl Slot for Task {
    fn slot(data: &Collections) -> &Vec<Self> {
        &data.tasks
    }
    fn slot_mut(data: &mut Collections) -> &mut Vec<Self> {
        &mut data.tasks
    }
}

impl Slot for TimetableEntry {
    fn slot(data: &Collections) -> &Vec<Self> {
        &data.timetable
    }
    fn slot_mut(data: &mut Collections) -> &mut Vec<Self> {
        &mut data.timetable
    }
}

impl Slot for Note {
    fn slot(data: &Collections) -> &Vec<Self> {
        &data.notes
    }
    fn slot_mut(data: &mut Collections) -> &mut Vec<Self> {
        &mut data.notes
    }
}

/// The records of the attached identity plus the machinery that keeps them
/// persisted locally and, on request, remotely.
///
/// Mutators never touch the network and never fail for a missing record or a
/// missing identity; they only reject invalid field values. `sync` takes
/// `&mut self`, so a single owner cannot run two pushes at once.
pub struct Workspace {
    cache: LocalCache,
    remote: Arc<dyn RemoteStore>,
    assistant: Option<Arc<dyn Assistant>>,
    identity: Option<String>,
    data: Collections,
    state: SyncState,
    cached_at: Option<DateTime<Utc>>,
    /// False while the local cache lacks some collection of the attached
    /// identity; the next mutation rewrites all of them.
    cache_complete: bool,
}

impl Workspace {
    pub fn new(cache: LocalCache, remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            cache,
            remote,
            assistant: None,
            identity: None,
            data: Collections::default(),
            state: SyncState::default(),
            cached_at: None,
            cache_complete: false,
        }
    }

    pub fn with_assistant(mut self, assistant: Arc<dyn Assistant>) -> Self {
        self.assistant = Some(assistant);
        self
    }

    /// Swap the remote store, e.g. after the session token changed
    pub fn set_remote(&mut self, remote: Arc<dyn RemoteStore>) {
        self.remote = remote;
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.data.tasks
    }

    pub fn timetable(&self) -> &[TimetableEntry] {
        &self.data.timetable
    }

    pub fn notes(&self) -> &[Note] {
        &self.data.notes
    }

    pub fn collections(&self) -> &Collections {
        &self.data
    }

    pub fn sync_state(&self) -> SyncState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state.is_dirty
    }

    /// Age of the last local save, e.g. "5m ago"
    pub fn cache_age(&self) -> Option<String> {
        self.cached_at.map(age_display)
    }

    /// Tasks matching `query`, incomplete first, then by deadline
    pub fn task_list(&self, query: &str) -> Vec<&Task> {
        models::task::filter_and_sort(&self.data.tasks, query)
    }

    /// Notes matching `query`, newest first
    pub fn note_list(&self, query: &str) -> Vec<&Note> {
        models::note::filter_and_sort(&self.data.notes, query)
    }

    pub fn timetable_sorted(&self) -> Vec<&TimetableEntry> {
        models::timetable::sorted_by_start(&self.data.timetable)
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Apply an identity change from the auth layer
    pub async fn on_identity_change(&mut self, identity: Option<&str>) -> Result<AttachOutcome, StorageError> {
        match identity {
            Some(id) if self.identity.as_deref() == Some(id) => Ok(AttachOutcome::Unchanged),
            Some(id) => self.attach(id).await,
            None => {
                self.detach();
                Ok(AttachOutcome::Detached)
            }
        }
    }

    /// Apply the latest value published on an identity watch channel
    pub async fn follow(&mut self, rx: &mut watch::Receiver<Option<String>>) -> Result<AttachOutcome, StorageError> {
        let identity = rx.borrow_and_update().clone();
        self.on_identity_change(identity.as_deref()).await
    }

    /// Attach `identity`: load its local snapshot, or pull it from the remote
    /// store when none exists.
    ///
    /// The previous identity's collections are cleared first. If the pull
    /// fails the workspace stays detached, so an empty collection is never
    /// mistaken for the user's data and pushed over it.
    pub async fn attach(&mut self, identity: &str) -> Result<AttachOutcome, StorageError> {
        self.detach();

        match self.cache.load(identity) {
            Ok(Some(snapshot)) => {
                info!(
                    user = identity,
                    tasks = snapshot.collections.tasks.len(),
                    timetable = snapshot.collections.timetable.len(),
                    notes = snapshot.collections.notes.len(),
                    dirty = snapshot.state.is_dirty,
                    "Loaded local snapshot"
                );
                self.data = snapshot.collections;
                self.state = snapshot.state;
                self.cached_at = Some(snapshot.cached_at);
                self.cache_complete = true;
                self.identity = Some(identity.to_string());
                return Ok(AttachOutcome::LoadedLocal);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(user = identity, error = %e, "Local snapshot unreadable, pulling from remote");
            }
        }

        let data = self.fetch_remote(identity).await?;
        self.install_remote(identity, data);
        Ok(AttachOutcome::PulledRemote)
    }

    /// Clear in-memory state. The local cache is kept for the next attach.
    pub fn detach(&mut self) {
        if let Some(ref id) = self.identity {
            debug!(user = %id, "Detaching identity");
        }
        self.identity = None;
        self.data = Collections::default();
        self.state = SyncState::default();
        self.cached_at = None;
        self.cache_complete = false;
    }

    // =========================================================================
    // Remote sync
    // =========================================================================

    async fn fetch_collection<R: Record>(&self, identity: &str) -> Result<Vec<R>, StorageError> {
        let tree = self
            .remote
            .read_all(&partition_path(identity, R::COLLECTION))
            .await?;
        tree_to_records(tree)
    }

    async fn fetch_remote(&self, identity: &str) -> Result<Collections, StorageError> {
        let (tasks, timetable, notes) = futures::try_join!(
            self.fetch_collection::<Task>(identity),
            self.fetch_collection::<TimetableEntry>(identity),
            self.fetch_collection::<Note>(identity),
        )?;
        Ok(Collections {
            tasks,
            timetable,
            notes,
        })
    }

    fn install_remote(&mut self, identity: &str, data: Collections) {
        info!(
            user = identity,
            tasks = data.tasks.len(),
            timetable = data.timetable.len(),
            notes = data.notes.len(),
            "Pulled collections from remote"
        );
        self.identity = Some(identity.to_string());
        self.data = data;
        self.state = SyncState::default();
        self.persist_state(identity);
        self.save_all(identity);
    }

    async fn push_collection<R: Slot>(&self, identity: &str) -> Result<usize, StorageError> {
        let records = R::slot(&self.data);
        let tree = records_to_tree(records)?;
        self.remote
            .write_all(&partition_path(identity, R::COLLECTION), &tree)
            .await?;
        Ok(records.len())
    }

    /// Push every collection to the remote store, replacing what is there.
    ///
    /// Collections are written in order and the first failure is returned;
    /// collections written before it stay written and the workspace stays
    /// dirty. Without an identity this does nothing.
    pub async fn sync(&mut self) -> Result<SyncReport, StorageError> {
        let Some(identity) = self.identity.clone() else {
            debug!("Sync requested without identity");
            return Ok(SyncReport::default());
        };

        let report = SyncReport {
            tasks: self.push_collection::<Task>(&identity).await?,
            timetable: self.push_collection::<TimetableEntry>(&identity).await?,
            notes: self.push_collection::<Note>(&identity).await?,
        };

        self.state.is_dirty = false;
        self.persist_state(&identity);
        info!(user = %identity, records = report.total(), "Sync complete");
        Ok(report)
    }

    /// Replace local collections with the remote ones, discarding unsynced
    /// local edits. On failure nothing changes.
    pub async fn pull(&mut self) -> Result<(), StorageError> {
        let Some(identity) = self.identity.clone() else {
            return Ok(());
        };
        let data = self.fetch_remote(&identity).await?;
        self.install_remote(&identity, data);
        Ok(())
    }

    /// Delete the attached identity's remote collections. Local records are
    /// kept and marked dirty, so a later sync writes them back.
    pub async fn clear_remote_partition(&mut self) -> Result<(), StorageError> {
        let Some(identity) = self.identity.clone() else {
            return Ok(());
        };
        for collection in models::Collection::ALL {
            self.remote
                .delete(&partition_path(&identity, collection))
                .await?;
        }
        info!(user = %identity, "Remote partition cleared");
        self.mark_dirty(&identity);
        Ok(())
    }

    // =========================================================================
    // Record mutators
    // =========================================================================

    fn persist_state(&self, identity: &str) {
        if let Err(e) = self.cache.save_sync_state(identity, &self.state) {
            warn!(user = identity, error = %e, "Failed to persist sync state");
        }
    }

    fn save_all(&mut self, identity: &str) {
        match self.cache.save_all(identity, &self.data) {
            Ok(()) => {
                self.cached_at = Some(Utc::now());
                self.cache_complete = true;
            }
            Err(e) => {
                warn!(user = identity, error = %e, "Failed to cache collections");
                self.cache_complete = false;
            }
        }
    }

    fn mark_dirty(&mut self, identity: &str) {
        self.state.is_dirty = true;
        self.persist_state(identity);
    }

    /// Run `op` on one collection, then rewrite that collection locally and
    /// mark dirty. Returns `None` without an identity, otherwise whether `op`
    /// reported a change. Dirty-marking happens even when nothing changed.
    fn mutate<R: Slot>(&mut self, op: impl FnOnce(&mut Vec<R>) -> bool) -> Option<bool> {
        let identity = self.identity.clone()?;
        let changed = op(R::slot_mut(&mut self.data));

        // Dirty flag first, so a snapshot on disk is never newer than its flag
        self.mark_dirty(&identity);
        if !self.cache_complete {
            self.save_all(&identity);
            return Some(changed);
        }
        match self.cache.save(&identity, R::slot(&self.data)) {
            Ok(()) => self.cached_at = Some(Utc::now()),
            Err(e) => {
                let collection = R::COLLECTION;
                warn!(user = %identity, %collection, error = %e, "Failed to write collection to local cache");
            }
        }
        Some(changed)
    }

    fn add_record<R: Slot>(&mut self, record: R) -> Option<String> {
        let id = record.id().to_string();
        self.mutate::<R>(|records| {
            records.push(record);
            true
        })?;
        Some(id)
    }

    fn update_record<R: Slot>(&mut self, record: R, merge: impl FnOnce(&R, R) -> R) -> bool {
        self.mutate::<R>(|records| match records.iter_mut().find(|r| r.id() == record.id()) {
            Some(existing) => {
                *existing = merge(&*existing, record);
                true
            }
            None => false,
        })
        .unwrap_or(false)
    }

    fn delete_record<R: Slot>(&mut self, id: &str) -> bool {
        self.mutate::<R>(|records| {
            let before = records.len();
            records.retain(|r| r.id() != id);
            records.len() != before
        })
        .unwrap_or(false)
    }

    /// Add a task. Returns the new id, or `None` without an identity.
    pub fn add_task(&mut self, draft: TaskDraft) -> Result<Option<String>, ValidationError> {
        draft.validate()?;
        Ok(self.add_record(Task::from_draft(new_record_id(), draft)))
    }

    /// Replace the task with the same id. Returns whether one was found.
    pub fn update_task(&mut self, task: Task) -> Result<bool, ValidationError> {
        task.validate()?;
        Ok(self.update_record(task, |_, new| new))
    }

    pub fn delete_task(&mut self, id: &str) -> bool {
        self.delete_record::<Task>(id)
    }

    pub fn toggle_task(&mut self, id: &str) -> bool {
        self.mutate::<Task>(|tasks| match tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.completed = !task.completed;
                true
            }
            None => false,
        })
        .unwrap_or(false)
    }

    pub fn add_entry(&mut self, draft: EntryDraft) -> Result<Option<String>, ValidationError> {
        draft.validate()?;
        Ok(self.add_record(TimetableEntry::from_draft(new_record_id(), draft)))
    }

    pub fn update_entry(&mut self, entry: TimetableEntry) -> Result<bool, ValidationError> {
        entry.validate()?;
        Ok(self.update_record(entry, |_, new| new))
    }

    pub fn delete_entry(&mut self, id: &str) -> bool {
        self.delete_record::<TimetableEntry>(id)
    }

    pub fn add_note(&mut self, draft: NoteDraft) -> Result<Option<String>, ValidationError> {
        draft.validate()?;
        Ok(self.add_record(Note::from_draft(new_record_id(), draft, Utc::now())))
    }

    /// Replace title and content of the note with the same id; its creation
    /// time is kept.
    pub fn update_note(&mut self, note: Note) -> Result<bool, ValidationError> {
        note.validate()?;
        Ok(self.update_record(note, |old, mut new| {
            new.created_at = old.created_at;
            new
        }))
    }

    pub fn delete_note(&mut self, id: &str) -> bool {
        self.delete_record::<Note>(id)
    }

    // =========================================================================
    // Assistant
    // =========================================================================

    fn assistant(&self) -> Result<&Arc<dyn Assistant>, AiError> {
        self.assistant.as_ref().ok_or(AiError::NotConfigured)
    }

    /// Open tasks, one summary line each
    pub fn tasks_text(&self) -> String {
        self.task_list("")
            .iter()
            .filter(|t| !t.completed)
            .map(|t| t.summary_line())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn schedule_text(&self) -> String {
        models::timetable::render_schedule(&self.data.timetable)
    }

    /// Ask the assistant for a priority and deadline for a new task
    pub async fn suggest_task_details(&self, description: &str) -> Result<TaskSuggestion, AiError> {
        let assistant = self.assistant()?;
        assistant.suggest(description, &self.schedule_text()).await
    }

    /// Ask the assistant to rearrange the timetable around open tasks
    pub async fn optimize_timetable(&self) -> Result<String, AiError> {
        let assistant = self.assistant()?;
        assistant
            .optimize(&self.tasks_text(), &self.schedule_text())
            .await
    }
}
