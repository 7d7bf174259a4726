//! Property-based tests for the session state machine.
//!
//! Arbitrary interleavings of key presses from an admin and a regular user
//! sharing one store must never panic, must keep every held cursor inside
//! the live list, and must leave the store consistent.

use std::sync::Arc;

use checklist_app::{KeyInput, Session, SessionAction, SessionEvent, View, render};
use checklist_core::{MemoryStorage, SimEnv, Store};
use proptest::prelude::*;

type TestSession = Session<SimEnv, MemoryStorage>;

fn key_strategy() -> impl Strategy<Value = KeyInput> {
    prop_oneof![
        4 => prop::sample::select(vec!['a', 'e', 'd', 'p', 'y', 'n', 'c', 'j', 'k', 'J', 'K', 'x'])
            .prop_map(KeyInput::Char),
        2 => Just(KeyInput::Enter),
        1 => Just(KeyInput::Backspace),
        1 => Just(KeyInput::Tab),
        2 => Just(KeyInput::Esc),
        2 => Just(KeyInput::Up),
        2 => Just(KeyInput::Down),
    ]
}

/// Which session receives the key, and the key itself.
fn step_strategy() -> impl Strategy<Value = (bool, KeyInput)> {
    (any::<bool>(), key_strategy())
}

fn cursor_in_range(session: &TestSession) -> bool {
    let count = session.store().todo_count();
    match session.view() {
        View::TodoList { cursor } | View::AdminHome { cursor } => *cursor < count.max(1),
        _ => true,
    }
}

fn signed_up(store: &Arc<Store<SimEnv, MemoryStorage>>, identity: &str) -> TestSession {
    let mut session = Session::new(Arc::clone(store), identity);
    for c in identity.chars() {
        session.handle(SessionEvent::Key(KeyInput::Char(c)));
    }
    session.handle(SessionEvent::Key(KeyInput::Enter));
    session
}

proptest! {
    #[test]
    fn prop_arbitrary_keys_keep_sessions_sound(
        steps in prop::collection::vec(step_strategy(), 0..200),
    ) {
        let env = SimEnv::new(1_000);
        let store = Arc::new(Store::open(env.clone(), MemoryStorage::new()));
        let mut admin = signed_up(&store, "admin");
        let mut user = signed_up(&store, "user");
        prop_assert!(admin.view().is_admin());
        prop_assert!(!user.view().is_admin());

        for (to_admin, key) in steps {
            let (actor, other) =
                if to_admin { (&mut admin, &mut user) } else { (&mut user, &mut admin) };

            let actions = actor.handle(SessionEvent::Key(key));
            // 'q' and Interrupt are excluded, Esc only quits the name prompt.
            prop_assert!(!actions.contains(&SessionAction::Quit));
            other.handle(SessionEvent::StoreChanged);
            env.advance(1);

            prop_assert!(cursor_in_range(actor));
            prop_assert!(cursor_in_range(other));
            prop_assert!(store.read().check_invariants().is_ok());

            // Rendering is total for any reachable state.
            let _ = render(&admin);
            let _ = render(&user);
        }

        // Roles never change, whatever was pressed.
        prop_assert!(store.get_user("admin").is_some_and(|u| u.is_admin));
        prop_assert!(store.get_user("user").is_some_and(|u| !u.is_admin));
    }

    #[test]
    fn prop_registration_prompt_limits_name(text in "[a-zA-Z ]{0,40}") {
        let store = Arc::new(Store::open(SimEnv::new(0), MemoryStorage::new()));
        let mut session = Session::new(Arc::clone(&store), "key");

        for c in text.chars() {
            session.handle(SessionEvent::Key(KeyInput::Char(c)));
        }
        session.handle(SessionEvent::Key(KeyInput::Enter));

        let typed: String = text.chars().take(20).collect();
        match store.get_user("key") {
            Some(user) => {
                prop_assert_eq!(user.display_name, typed.trim());
                prop_assert!(user.is_admin);
            },
            None => prop_assert!(typed.trim().is_empty()),
        }
    }
}
