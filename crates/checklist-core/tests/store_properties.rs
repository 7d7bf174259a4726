//! Property-based tests for the store.
//!
//! Arbitrary sequences of admin operations must keep the order/items
//! bijection intact and agree with a simple `Vec` model of the list.

use checklist_core::{
    Committed, Direction, MemoryStorage, MoveOutcome, SimEnv, Store, StoreError, codec,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Add(String),
    Edit(usize, String),
    Delete(usize),
    Move(usize, bool),
    Complete(usize, usize),
    Register(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => "[a-z]{1,8}".prop_map(Op::Add),
        1 => (0usize..12, "[a-z]{0,8}").prop_map(|(i, name)| Op::Edit(i, name)),
        2 => (0usize..12).prop_map(Op::Delete),
        3 => (0usize..12, any::<bool>()).prop_map(|(i, up)| Op::Move(i, up)),
        2 => (0usize..4, 0usize..12).prop_map(|(u, i)| Op::Complete(u, i)),
        1 => (0usize..4).prop_map(Op::Register),
    ]
}

/// Resolve an index against the model, falling back to an id that never
/// existed so not-found paths are exercised too.
fn id_at(model: &[(String, String)], index: usize) -> String {
    model.get(index).map_or_else(|| "todo_missing".to_string(), |(id, _)| id.clone())
}

proptest! {
    #[test]
    fn prop_order_matches_model(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let env = SimEnv::new(1_000);
        let store = Store::open(env.clone(), MemoryStorage::new());
        let mut model: Vec<(String, String)> = Vec::new();

        for op in ops {
            match op {
                Op::Add(name) => {
                    let item = store.add_todo(&name, "").value;
                    prop_assert!(model.iter().all(|(id, _)| id != &item.id));
                    model.push((item.id, name));
                    // Half the time keep the clock frozen to force id collisions.
                    if model.len() % 2 == 0 {
                        env.advance(1);
                    }
                },
                Op::Edit(i, name) => {
                    let id = id_at(&model, i);
                    let result = store.edit_todo(&id, &name, "d");
                    match model.iter_mut().find(|(candidate, _)| candidate == &id) {
                        Some(entry) => {
                            prop_assert!(result.is_ok());
                            entry.1 = name;
                        },
                        None => prop_assert_eq!(result, Err(StoreError::TodoNotFound(id.clone()))),
                    }
                },
                Op::Delete(i) => {
                    let id = id_at(&model, i);
                    let result = store.delete_todo(&id);
                    if i < model.len() {
                        prop_assert!(result.is_ok());
                        model.remove(i);
                    } else {
                        prop_assert!(result.is_err());
                    }
                },
                Op::Move(i, up) => {
                    let id = id_at(&model, i);
                    let direction = if up { Direction::Up } else { Direction::Down };
                    let result = store.move_todo(&id, direction).map(Committed::into_value);
                    if i >= model.len() {
                        prop_assert!(result.is_err());
                    } else if (up && i == 0) || (!up && i + 1 == model.len()) {
                        prop_assert_eq!(result, Ok(MoveOutcome::NoOp));
                    } else {
                        let target = if up { i - 1 } else { i + 1 };
                        prop_assert_eq!(result, Ok(MoveOutcome::Moved { index: target }));
                        model.swap(i, target);
                    }
                },
                Op::Complete(u, i) => {
                    let _ = store.mark_complete(&format!("user-{u}"), &id_at(&model, i));
                },
                Op::Register(u) => {
                    let _ = store.register_user(&format!("user-{u}"), "name");
                },
            }

            let state = store.snapshot();
            prop_assert!(state.check_invariants().is_ok());
            let names: Vec<_> = state.ordered_todos().map(|t| t.name.clone()).collect();
            let expected: Vec<_> = model.iter().map(|(_, name)| name.clone()).collect();
            prop_assert_eq!(names, expected);
        }

        // What was written last decodes to what is in memory.
        if let Some(bytes) = store.storage().document() {
            prop_assert_eq!(codec::decode(&bytes).ok(), Some(store.snapshot()));
        }
    }

    #[test]
    fn prop_only_first_user_is_admin(count in 1usize..10) {
        let store = Store::open(SimEnv::new(0), MemoryStorage::new());

        for i in 0..count {
            let user = store.register_user(&format!("key-{i}"), "name").unwrap().value;
            prop_assert_eq!(user.is_admin, i == 0);
        }

        // Re-registration never changes admin status.
        for i in 0..count {
            let key = format!("key-{i}");
            prop_assert!(store.register_user(&key, "again").is_err());
            prop_assert_eq!(store.get_user(&key).map(|u| u.is_admin), Some(i == 0));
        }
    }

    #[test]
    fn prop_completion_is_idempotent(repeats in 1usize..5) {
        let store = Store::open(SimEnv::new(0), MemoryStorage::new());
        store.register_user("admin", "admin").unwrap();
        store.register_user("bob", "bob").unwrap();
        let item = store.add_todo("Task", "").value;

        store.mark_complete("bob", &item.id).unwrap();
        let once = store.get_user("bob").map(|u| u.completions);

        for _ in 0..repeats {
            store.mark_complete("bob", &item.id).unwrap();
        }

        prop_assert_eq!(store.get_user("bob").map(|u| u.completions), once);
    }
}

#[test]
fn move_at_boundaries_is_no_op() {
    let store = Store::open(SimEnv::new(0), MemoryStorage::new());
    let first = store.add_todo("first", "").value;
    let middle = store.add_todo("middle", "").value;
    let last = store.add_todo("last", "").value;
    let before = store.list_todos();

    let up = store.move_todo(&first.id, Direction::Up).unwrap();
    let down = store.move_todo(&last.id, Direction::Down).unwrap();
    assert_eq!(up.value, MoveOutcome::NoOp);
    assert_eq!(down.value, MoveOutcome::NoOp);
    assert!(up.is_durable() && down.is_durable());

    assert_eq!(store.list_todos(), before);
    assert_eq!(store.list_todos()[1], middle);
}
