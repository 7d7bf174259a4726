//! The shared store.
//!
//! [`Store`] wraps [`StoreState`] in a reader-writer lock. Reads take the
//! shared lock. Every mutation takes the exclusive lock and holds it across
//! both the in-memory update and the durable write, so no reader ever sees a
//! state that was not at least offered to storage.
//!
//! Durability is best-effort: a failed write is logged and the in-memory
//! change stays. The running process treats memory as authoritative. Each
//! mutation hands its own write outcome back to the caller in a
//! [`Committed`]; [`Store::last_persist_error`] only tracks the most recent
//! write across all callers.
//!
//! After each committed mutation the store bumps a revision number on a
//! [`tokio::sync::watch`] channel so sessions can re-render.

#![allow(clippy::disallowed_types, reason = "Store operations never await while locked")]

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::watch;

use crate::{
    CompletionStats, Direction, Environment, MoveOutcome, Storage, StorageError, StoreError,
    StoreState, TodoItem, User, codec,
};

/// A mutation that was applied in memory, with the outcome of its own write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed<T> {
    /// What the mutation produced.
    pub value: T,
    /// Set when writing this mutation to storage failed.
    pub persist_error: Option<StorageError>,
}

impl<T> Committed<T> {
    /// A result with nothing to write.
    fn unwritten(value: T) -> Self {
        Self { value, persist_error: None }
    }

    /// Discard the write outcome.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Whether the change reached storage, or needed no write.
    pub fn is_durable(&self) -> bool {
        self.persist_error.is_none()
    }
}

/// Process-wide checklist store.
///
/// # Type Parameters
///
/// - `E`: clock used for id generation
/// - `S`: durable storage backend
pub struct Store<E: Environment, S: Storage> {
    inner: RwLock<Inner>,
    storage: S,
    env: E,
    revision: watch::Sender<u64>,
}

struct Inner {
    state: StoreState,
    last_persist_error: Option<StorageError>,
}

/// Shared read access to the whole state.
///
/// Holds the read lock; mutations in other sessions wait until it is dropped,
/// so keep it short-lived.
pub struct StoreRead<'a> {
    guard: RwLockReadGuard<'a, Inner>,
}

impl std::ops::Deref for StoreRead<'_> {
    type Target = StoreState;

    fn deref(&self) -> &StoreState {
        &self.guard.state
    }
}

impl<E: Environment, S: Storage> Store<E, S> {
    /// Load the store from `storage`.
    ///
    /// A missing or empty document yields an empty store. An unreadable or
    /// corrupt document is logged and also yields an empty store; the bad
    /// document is overwritten by the next mutation.
    pub fn open(env: E, storage: S) -> Self {
        let state = match storage.load() {
            Ok(None) => {
                tracing::info!("No stored checklist found, starting empty");
                StoreState::default()
            },
            Ok(Some(bytes)) => match codec::decode(&bytes) {
                Ok(state) => {
                    tracing::info!(
                        users = state.users.len(),
                        todos = state.todo_count(),
                        "Loaded checklist"
                    );
                    state
                },
                Err(e) => {
                    tracing::error!(
                        "Stored checklist is unreadable ({e}); starting empty, the stored copy \
                         will be replaced on the next change"
                    );
                    StoreState::default()
                },
            },
            Err(e) => {
                tracing::error!("Failed to read stored checklist ({e}); starting empty");
                StoreState::default()
            },
        };

        Self::with_state(env, storage, state)
    }

    /// Store with an explicit initial state; nothing is loaded or written.
    pub fn with_state(env: E, storage: S, state: StoreState) -> Self {
        debug_assert!(state.check_invariants().is_ok());

        let (revision, _) = watch::channel(0);
        Self { inner: RwLock::new(Inner { state, last_persist_error: None }), storage, env, revision }
    }

    /// Shared read access for rendering and multi-step reads.
    pub fn read(&self) -> StoreRead<'_> {
        StoreRead { guard: self.inner.read().unwrap_or_else(PoisonError::into_inner) }
    }

    /// Copy of the full state.
    pub fn snapshot(&self) -> StoreState {
        self.read().clone()
    }

    /// Receiver that observes the revision after every committed mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Number of committed mutations since open.
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Outcome of the most recent durable write by any caller. `None` if it
    /// succeeded.
    pub fn last_persist_error(&self) -> Option<StorageError> {
        self.read_inner().last_persist_error.clone()
    }

    /// Storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// User registered under `identity`.
    pub fn get_user(&self, identity: &str) -> Option<User> {
        self.read().user(identity).cloned()
    }

    /// Register a user. The first user ever registered becomes admin.
    pub fn register_user(
        &self,
        identity: &str,
        display_name: &str,
    ) -> Result<Committed<User>, StoreError> {
        let mut inner = self.write_inner();
        let user = inner.state.register_user(identity, display_name)?;
        tracing::info!(identity, display_name, admin = user.is_admin, "Registered user");
        let persist_error = self.commit(&mut inner);
        Ok(Committed { value: user, persist_error })
    }

    /// All items in display order.
    pub fn list_todos(&self) -> Vec<TodoItem> {
        self.read().ordered_todos().cloned().collect()
    }

    /// Number of items.
    pub fn todo_count(&self) -> usize {
        self.read().todo_count()
    }

    /// Item at `index` in display order.
    pub fn todo_at(&self, index: usize) -> Option<TodoItem> {
        self.read().todo_at(index).cloned()
    }

    /// Append a new item with a fresh id.
    pub fn add_todo(&self, name: &str, description: &str) -> Committed<TodoItem> {
        let mut inner = self.write_inner();
        let id = inner.state.next_todo_id(self.env.wall_clock_millis());
        let item = inner.state.add_todo(id, name, description);
        tracing::debug!(id = %item.id, "Added todo");
        let persist_error = self.commit(&mut inner);
        Committed { value: item, persist_error }
    }

    /// Replace an item's name and description.
    pub fn edit_todo(
        &self,
        id: &str,
        name: &str,
        description: &str,
    ) -> Result<Committed<()>, StoreError> {
        let mut inner = self.write_inner();
        inner.state.edit_todo(id, name, description)?;
        tracing::debug!(id, "Edited todo");
        let persist_error = self.commit(&mut inner);
        Ok(Committed { value: (), persist_error })
    }

    /// Remove an item. Completion records pointing at it are kept.
    pub fn delete_todo(&self, id: &str) -> Result<Committed<()>, StoreError> {
        let mut inner = self.write_inner();
        inner.state.delete_todo(id)?;
        tracing::debug!(id, "Deleted todo");
        let persist_error = self.commit(&mut inner);
        Ok(Committed { value: (), persist_error })
    }

    /// Swap an item with its neighbour. At a boundary this is a no-op and
    /// nothing is written.
    pub fn move_todo(
        &self,
        id: &str,
        direction: Direction,
    ) -> Result<Committed<MoveOutcome>, StoreError> {
        let mut inner = self.write_inner();
        let outcome = inner.state.move_todo(id, direction)?;
        let MoveOutcome::Moved { index } = outcome else {
            return Ok(Committed::unwritten(outcome));
        };
        tracing::debug!(id, index, "Moved todo");
        let persist_error = self.commit(&mut inner);
        Ok(Committed { value: outcome, persist_error })
    }

    /// Record that `identity` completed `todo_id`. Idempotent.
    pub fn mark_complete(
        &self,
        identity: &str,
        todo_id: &str,
    ) -> Result<Committed<()>, StoreError> {
        let mut inner = self.write_inner();
        if !inner.state.mark_complete(identity, todo_id)? {
            return Ok(Committed::unwritten(()));
        }
        tracing::debug!(identity, todo_id, "Marked complete");
        let persist_error = self.commit(&mut inner);
        Ok(Committed { value: (), persist_error })
    }

    /// Completion count for `todo_id` over non-admin users.
    pub fn completion_stats(&self, todo_id: &str) -> CompletionStats {
        self.read().completion_stats(todo_id)
    }

    /// Persist the current state and publish a new revision.
    ///
    /// Called with the write lock held. Returns the write failure, if any.
    fn commit(&self, inner: &mut Inner) -> Option<StorageError> {
        debug_assert!(inner.state.check_invariants().is_ok());

        let result = codec::encode(&inner.state)
            .map_err(StorageError::from)
            .and_then(|bytes| self.storage.save(&bytes));

        let persist_error = match result {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!("Failed to persist checklist, keeping in-memory change: {e}");
                Some(e)
            },
        };
        inner.last_persist_error.clone_from(&persist_error);

        self.revision.send_modify(|revision| *revision += 1);
        persist_error
    }

    fn read_inner(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_inner(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
