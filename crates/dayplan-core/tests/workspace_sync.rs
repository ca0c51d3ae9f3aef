use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::json;

use dayplan_core::cache::{KeyValueStore, LocalCache, MemoryStore};
use dayplan_core::models::{Collection, EntryDraft, NoteDraft, Priority, Task, TaskDraft};
use dayplan_core::remote::{partition_path, MemoryRemote, StorageError};
use dayplan_core::sync::{AttachOutcome, SyncReport};
use dayplan_core::Workspace;

fn setup() -> (Workspace, MemoryRemote, MemoryStore) {
    let remote = MemoryRemote::new();
    let store = MemoryStore::new();
    let ws = Workspace::new(LocalCache::new(Arc::new(store.clone())), Arc::new(remote.clone()));
    (ws, remote, store)
}

fn task_draft(title: &str) -> TaskDraft {
    TaskDraft {
        title: title.to_string(),
        description: "Y".to_string(),
        priority: Priority::Low,
        deadline: Utc.with_ymd_and_hms(2026, 11, 2, 17, 0, 0).unwrap(),
    }
}

fn seed_two_tasks(remote: &MemoryRemote, user: &str) {
    remote.insert(
        &partition_path(user, Collection::Tasks),
        json!({
            "task-1": {
                "id": "task-1",
                "title": "Finish Q3 Report",
                "description": "Compile all data",
                "priority": "High",
                "deadline": "2026-10-22T09:00:00.000Z",
                "completed": false
            },
            "task-2": {
                "id": "task-2",
                "title": "Plan Team Offsite",
                "description": "Venue and budget",
                "priority": "Medium",
                "deadline": "2026-10-26T09:00:00.000Z",
                "completed": true
            }
        }),
    );
}

#[tokio::test]
async fn test_initial_pull_when_no_local_snapshot() {
    let (mut ws, remote, store) = setup();
    seed_two_tasks(&remote, "u1");

    let outcome = ws.attach("u1").await.unwrap();

    assert_eq!(outcome, AttachOutcome::PulledRemote);
    assert_eq!(ws.tasks().len(), 2);
    assert!(ws.timetable().is_empty());
    assert!(!ws.is_dirty());
    // The pull is cached, so the next attach stays offline
    assert!(store.get_item("tasks_u1").unwrap().is_some());
    assert_eq!(store.get_item("isDirty_u1").unwrap().as_deref(), Some("false"));
}

#[tokio::test]
async fn test_local_snapshot_wins_without_network() {
    let (mut ws, remote, _) = setup();
    ws.attach("u1").await.unwrap();
    ws.add_task(task_draft("Local only")).unwrap();
    let reads_before = remote.request_counts().0;

    seed_two_tasks(&remote, "u1");
    ws.detach();
    let outcome = ws.attach("u1").await.unwrap();

    assert_eq!(outcome, AttachOutcome::LoadedLocal);
    assert_eq!(remote.request_counts().0, reads_before);
    assert_eq!(ws.tasks().len(), 1);
    assert_eq!(ws.tasks()[0].title, "Local only");
    // Dirty flag is restored with the snapshot
    assert!(ws.is_dirty());
}

#[tokio::test]
async fn test_add_marks_dirty_and_defaults_incomplete() {
    let (mut ws, _, _) = setup();
    ws.attach("u1").await.unwrap();
    assert!(!ws.is_dirty());

    let id = ws.add_task(task_draft("X")).unwrap().expect("identity attached");

    assert_eq!(ws.tasks().len(), 1);
    let task = &ws.tasks()[0];
    assert_eq!(task.id, id);
    assert!(!task.completed);
    assert_eq!(task.priority, Priority::Low);
    assert!(ws.is_dirty());
}

#[tokio::test]
async fn test_add_then_delete_restores_collection() {
    let (mut ws, remote, _) = setup();
    seed_two_tasks(&remote, "u1");
    ws.attach("u1").await.unwrap();
    let before: Vec<Task> = ws.tasks().to_vec();

    let id = ws.add_task(task_draft("Temp")).unwrap().unwrap();
    assert!(ws.delete_task(&id));
    assert_eq!(ws.tasks(), before.as_slice());

    let id = ws
        .add_entry(EntryDraft {
            subject: "Gym".to_string(),
            start_time: "18:00".to_string(),
            end_time: "19:00".to_string(),
        })
        .unwrap()
        .unwrap();
    assert!(ws.delete_entry(&id));
    assert!(ws.timetable().is_empty());

    let id = ws
        .add_note(NoteDraft { title: "Temp".to_string(), content: String::new() })
        .unwrap()
        .unwrap();
    assert!(ws.delete_note(&id));
    assert!(ws.notes().is_empty());
}

#[tokio::test]
async fn test_update_unknown_id_leaves_collection_but_marks_dirty() {
    let (mut ws, remote, _) = setup();
    seed_two_tasks(&remote, "u1");
    ws.attach("u1").await.unwrap();
    let before: Vec<Task> = ws.tasks().to_vec();

    let mut ghost = before[0].clone();
    ghost.id = "missing".to_string();
    ghost.title = "Ghost".to_string();

    assert!(!ws.update_task(ghost).unwrap());
    assert_eq!(ws.tasks(), before.as_slice());
    assert!(ws.is_dirty());
}

#[tokio::test]
async fn test_every_mutator_marks_clean_workspace_dirty() {
    let (mut ws, remote, store) = setup();
    seed_two_tasks(&remote, "u1");
    remote.insert(
        &partition_path("u1", Collection::Timetable),
        json!({"e1": {"id": "e1", "subject": "Standup", "startTime": "09:00", "endTime": "09:15"}}),
    );
    remote.insert(
        &partition_path("u1", Collection::Notes),
        json!({"n1": {"id": "n1", "title": "Ideas", "content": "", "createdAt": "2026-10-01T08:00:00Z"}}),
    );

    type Mutation = fn(&mut Workspace) -> bool;
    let mutations: [(&str, Mutation); 15] = [
        ("add_task", |ws: &mut Workspace| ws.add_task(task_draft("New")).unwrap().is_some()),
        ("update_task", |ws: &mut Workspace| {
            let mut task = ws.tasks()[0].clone();
            task.title = "Renamed".to_string();
            ws.update_task(task).unwrap()
        }),
        ("update_task unknown", |ws: &mut Workspace| {
            let mut task = ws.tasks()[0].clone();
            task.id = "missing".to_string();
            !ws.update_task(task).unwrap()
        }),
        ("toggle_task", |ws: &mut Workspace| ws.toggle_task("task-1")),
        ("toggle_task unknown", |ws: &mut Workspace| !ws.toggle_task("missing")),
        ("delete_task", |ws: &mut Workspace| ws.delete_task("task-2")),
        ("delete_task unknown", |ws: &mut Workspace| !ws.delete_task("missing")),
        ("add_entry", |ws: &mut Workspace| {
            ws.add_entry(EntryDraft {
                subject: "Gym".to_string(),
                start_time: "18:00".to_string(),
                end_time: "19:00".to_string(),
            })
            .unwrap()
            .is_some()
        }),
        ("update_entry", |ws: &mut Workspace| {
            let mut entry = ws.timetable()[0].clone();
            entry.end_time = "09:30".to_string();
            ws.update_entry(entry).unwrap()
        }),
        ("delete_entry", |ws: &mut Workspace| ws.delete_entry("e1")),
        ("delete_entry unknown", |ws: &mut Workspace| !ws.delete_entry("missing")),
        ("add_note", |ws: &mut Workspace| {
            ws.add_note(NoteDraft { title: "New".to_string(), content: String::new() })
                .unwrap()
                .is_some()
        }),
        ("update_note", |ws: &mut Workspace| {
            let mut note = ws.notes()[0].clone();
            note.content = "more".to_string();
            ws.update_note(note).unwrap()
        }),
        ("delete_note", |ws: &mut Workspace| ws.delete_note("n1")),
        ("delete_note unknown", |ws: &mut Workspace| !ws.delete_note("missing")),
    ];

    ws.attach("u1").await.unwrap();
    for (name, mutation) in mutations {
        ws.pull().await.unwrap();
        assert!(!ws.is_dirty(), "{name}: expected clean start");

        assert!(mutation(&mut ws), "{name}: unexpected change report");
        assert!(ws.is_dirty(), "{name}: not marked dirty");
        assert_eq!(
            store.get_item("isDirty_u1").unwrap().as_deref(),
            Some("true"),
            "{name}: dirty flag not persisted"
        );
    }
}

#[tokio::test]
async fn test_sync_pushes_full_collections_and_clears_dirty() {
    let (mut ws, remote, store) = setup();
    seed_two_tasks(&remote, "u1");
    ws.attach("u1").await.unwrap();
    assert!(ws.delete_task("task-2"));
    ws.add_note(NoteDraft { title: "Idea".to_string(), content: "body".to_string() })
        .unwrap();

    let report = ws.sync().await.unwrap();

    assert_eq!(report, SyncReport { tasks: 1, timetable: 0, notes: 1 });
    assert!(!ws.is_dirty());
    assert_eq!(store.get_item("isDirty_u1").unwrap().as_deref(), Some("false"));

    // Whole-collection overwrite: the deleted task is gone remotely too
    let tasks = remote.get(&partition_path("u1", Collection::Tasks)).unwrap();
    assert!(tasks.get("task-2").is_none());
    assert_eq!(tasks["task-1"]["title"], "Finish Q3 Report");
    assert_eq!(
        remote.get(&partition_path("u1", Collection::Timetable)),
        Some(json!({}))
    );
}

#[tokio::test]
async fn test_failed_sync_keeps_dirty_and_local_data() {
    let (mut ws, remote, store) = setup();
    ws.attach("u1").await.unwrap();
    ws.add_task(task_draft("Keep me")).unwrap();
    let cached_tasks = store.get_item("tasks_u1").unwrap();
    let tasks_before: Vec<Task> = ws.tasks().to_vec();

    remote.fail_writes_to(&partition_path("u1", Collection::Timetable));
    let err = ws.sync().await.unwrap_err();

    assert!(matches!(err, StorageError::Unavailable(_)));
    assert!(ws.is_dirty());
    assert_eq!(ws.tasks(), tasks_before.as_slice());
    assert_eq!(store.get_item("tasks_u1").unwrap(), cached_tasks);
    assert_eq!(store.get_item("isDirty_u1").unwrap().as_deref(), Some("true"));

    // Collections written before the failure are not rolled back
    assert!(remote.get(&partition_path("u1", Collection::Tasks)).is_some());

    remote.heal();
    ws.sync().await.unwrap();
    assert!(!ws.is_dirty());
}

#[tokio::test]
async fn test_switching_identity_does_not_leak_records() {
    let (mut ws, remote, _) = setup();
    seed_two_tasks(&remote, "u1");
    ws.attach("u1").await.unwrap();
    assert_eq!(ws.tasks().len(), 2);

    remote.fail_reads_from(&partition_path("u2", Collection::Notes));
    assert!(ws.on_identity_change(Some("u2")).await.is_err());

    // u1's records were dropped before u2's pull was attempted
    assert!(ws.tasks().is_empty());
    assert!(ws.identity().is_none());
    assert!(ws.add_task(task_draft("orphan")).unwrap().is_none());

    remote.heal();
    assert_eq!(
        ws.on_identity_change(Some("u2")).await.unwrap(),
        AttachOutcome::PulledRemote
    );
    assert!(ws.tasks().is_empty());
    assert_eq!(ws.identity(), Some("u2"));
}

#[tokio::test]
async fn test_detach_keeps_local_cache() {
    let (mut ws, _, store) = setup();
    ws.attach("u1").await.unwrap();
    ws.add_task(task_draft("X")).unwrap();

    assert_eq!(ws.on_identity_change(None).await.unwrap(), AttachOutcome::Detached);
    assert!(ws.tasks().is_empty());
    assert!(!ws.is_dirty());
    assert!(store.get_item("tasks_u1").unwrap().is_some());

    assert_eq!(ws.on_identity_change(Some("u1")).await.unwrap(), AttachOutcome::LoadedLocal);
    assert_eq!(ws.tasks().len(), 1);
    assert_eq!(ws.on_identity_change(Some("u1")).await.unwrap(), AttachOutcome::Unchanged);
}

#[tokio::test]
async fn test_corrupt_snapshot_falls_back_to_pull() {
    let (mut ws, remote, store) = setup();
    seed_two_tasks(&remote, "u1");
    ws.attach("u1").await.unwrap();
    ws.detach();

    store.set_item("tasks_u1", "not json").unwrap();
    assert_eq!(ws.attach("u1").await.unwrap(), AttachOutcome::PulledRemote);
    assert_eq!(ws.tasks().len(), 2);
}

#[tokio::test]
async fn test_pull_discards_local_edits() {
    let (mut ws, remote, _) = setup();
    seed_two_tasks(&remote, "u1");
    ws.attach("u1").await.unwrap();
    ws.add_task(task_draft("Unsynced")).unwrap();
    assert!(ws.is_dirty());

    ws.pull().await.unwrap();
    assert_eq!(ws.tasks().len(), 2);
    assert!(!ws.is_dirty());
}

#[tokio::test]
async fn test_clear_remote_partition_marks_dirty() {
    let (mut ws, remote, _) = setup();
    seed_two_tasks(&remote, "u1");
    ws.attach("u1").await.unwrap();

    ws.clear_remote_partition().await.unwrap();
    assert!(remote.get(&partition_path("u1", Collection::Tasks)).is_none());
    assert_eq!(ws.tasks().len(), 2);
    assert!(ws.is_dirty());

    ws.sync().await.unwrap();
    assert!(remote.get(&partition_path("u1", Collection::Tasks)).is_some());
}

#[tokio::test]
async fn test_sync_without_identity_is_noop() {
    let (mut ws, remote, _) = setup();
    assert_eq!(ws.sync().await.unwrap(), SyncReport::default());
    assert_eq!(remote.request_counts(), (0, 0));
}

#[tokio::test]
async fn test_follow_identity_channel() {
    let (mut ws, remote, _) = setup();
    seed_two_tasks(&remote, "u1");
    let (tx, mut rx) = tokio::sync::watch::channel(None::<String>);

    tx.send(Some("u1".to_string())).unwrap();
    rx.changed().await.unwrap();
    assert_eq!(ws.follow(&mut rx).await.unwrap(), AttachOutcome::PulledRemote);
    assert_eq!(ws.tasks().len(), 2);

    tx.send(None).unwrap();
    rx.changed().await.unwrap();
    assert_eq!(ws.follow(&mut rx).await.unwrap(), AttachOutcome::Detached);
    assert!(ws.tasks().is_empty());
}
