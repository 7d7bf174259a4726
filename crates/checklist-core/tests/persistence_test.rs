//! Durability tests for `FileStorage`-backed stores.
//!
//! These reopen the same data file with a fresh `Store`, simulating a server
//! restart.

use checklist_core::{
    ChaoticStorage, CompletionStats, Direction, FileStorage, MemoryStorage, SimEnv, Storage,
    Store, StorageError, codec,
};
use tempfile::tempdir;

fn open(path: &std::path::Path) -> Store<SimEnv, FileStorage> {
    Store::open(SimEnv::new(1_700_000_000_000), FileStorage::new(path))
}

#[test]
fn test_state_survives_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("checklist_data.json");

    let before = {
        let store = open(&path);
        store.register_user("key-alice", "alice").unwrap();
        store.register_user("key-bob", "bob").unwrap();
        let a = store.add_todo("Task A", "desc a").value;
        let b = store.add_todo("Task B", "desc b").value;
        store.move_todo(&b.id, Direction::Up).unwrap();
        store.mark_complete("key-bob", &a.id).unwrap();
        store.snapshot()
    };

    let store = open(&path);
    assert_eq!(store.snapshot(), before);
    assert!(store.get_user("key-alice").is_some_and(|u| u.is_admin));
    assert_eq!(
        store.list_todos().iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
        ["Task B", "Task A"]
    );
}

#[test]
fn test_missing_file_starts_empty() {
    let dir = tempdir().unwrap();
    let store = open(&dir.path().join("absent.json"));

    assert_eq!(store.todo_count(), 0);
    assert!(store.snapshot().users.is_empty());
}

#[test]
fn test_empty_file_starts_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.json");
    std::fs::write(&path, "\n").unwrap();

    let store = open(&path);
    assert_eq!(store.todo_count(), 0);
}

#[test]
fn test_corrupt_file_starts_empty_and_is_replaced() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("corrupt.json");
    std::fs::write(&path, "{ \"users\": { oops").unwrap();

    let store = open(&path);
    assert_eq!(store.todo_count(), 0);
    assert!(store.snapshot().users.is_empty());

    // First user after a reset is admin again; the corrupt file is overwritten.
    assert!(store.register_user("key-carol", "carol").unwrap().value.is_admin);
    let reopened = open(&path);
    assert!(reopened.get_user("key-carol").is_some());
}

#[test]
fn test_inconsistent_file_starts_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("inconsistent.json");
    std::fs::write(&path, r#"{ "todo_items": {}, "todo_order": ["todo_1", "todo_1"] }"#).unwrap();

    assert_eq!(open(&path).todo_count(), 0);
}

#[test]
fn test_data_file_is_human_readable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("readable.json");

    let store = open(&path);
    store.register_user("key-alice", "alice").unwrap();
    store.add_todo("Water plants", "Every pot on the balcony");

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"display_name\": \"alice\""));
    assert!(text.contains("\"name\": \"Water plants\""));
    assert!(text.contains("\"todo_order\""));
}

#[test]
fn test_write_failure_is_warning_only() {
    let storage = ChaoticStorage::new(MemoryStorage::new(), 1.0);
    let store = Store::open(SimEnv::new(0), storage.clone());

    let user = store.register_user("key-alice", "alice").unwrap().value;
    let added = store.add_todo("Task", "");
    assert_eq!(added.persist_error, Some(StorageError::Injected));
    let item = added.into_value();

    assert!(user.is_admin);
    assert_eq!(store.list_todos(), vec![item]);
    assert_eq!(store.last_persist_error(), Some(StorageError::Injected));
    assert_eq!(storage.inner().load(), Ok(None));
    assert_eq!(storage.save_attempts(), 2);
}

#[test]
fn test_intermittent_write_failures_recover() {
    let storage = ChaoticStorage::with_seed(MemoryStorage::new(), 0.5, 7);
    let store = Store::open(SimEnv::new(0), storage.clone());

    for i in 0..20 {
        store.add_todo(&format!("task {i}"), "");
    }

    assert_eq!(store.todo_count(), 20);
    assert_eq!(storage.save_attempts(), 20);
    assert!(storage.inner().save_count() < 20);

    // Whatever reached storage is a complete, earlier state.
    let saved = codec::decode(&storage.inner().document().unwrap()).unwrap();
    assert!(saved.check_invariants().is_ok());
    assert_eq!(saved.todo_order[..], store.snapshot().todo_order[..saved.todo_count()]);
}

#[test]
fn test_two_user_scenario() {
    let store = Store::open(SimEnv::new(10), MemoryStorage::new());

    let alice = store.register_user("alice", "alice").unwrap().value;
    assert!(alice.is_admin);

    let a = store.add_todo("Task A", "desc").value;
    let b = store.add_todo("Task B", "desc").value;
    assert_eq!(store.list_todos(), vec![a.clone(), b.clone()]);

    store.move_todo(&b.id, Direction::Up).unwrap();
    assert_eq!(store.list_todos(), vec![b.clone(), a.clone()]);

    let bob = store.register_user("bob", "bob").unwrap().value;
    assert!(!bob.is_admin);

    store.mark_complete("bob", &b.id).unwrap();
    assert_eq!(store.completion_stats(&b.id), CompletionStats { completed: 1, total: 1 });
    assert_eq!(store.completion_stats(&a.id), CompletionStats { completed: 0, total: 1 });
}
