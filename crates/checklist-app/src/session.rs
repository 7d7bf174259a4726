//! Session state machine.
//!
//! This module defines [`Session`], one per connected client. It holds the
//! client's identity, its current [`View`] and transient UI state, and
//! dispatches key input to one handler per view.
//!
//! Unlike a purely Sans-IO machine, handlers call the shared
//! [`Store`] directly: store operations are synchronous, never await, and
//! are atomic with respect to other sessions. What is left for the runtime
//! is output and termination, expressed as [`SessionAction`]s.
//!
//! # Cursor discipline
//!
//! Other sessions may shrink or reorder the list at any time. Every handler
//! re-resolves its cursor against the live item count before using it, and a
//! [`SessionEvent::StoreChanged`] clamps all held cursors.

use std::sync::Arc;

use checklist_core::{
    Committed, Direction, Environment, MoveOutcome, Storage, Store, StoreError, TodoItem, User,
};

use crate::{
    KeyInput, SessionAction, SessionEvent,
    view::{EditForm, MAX_DISPLAY_NAME, View, clamp_cursor, push_limited},
};

/// Status shown when an item vanished between opening a view and acting on it.
const ITEM_GONE: &str = "That item was removed by someone else.";

/// Status shown when a change was applied but writing the data file failed.
const NOT_SAVED: &str = "Change applied, but saving to disk failed.";

/// Per-connection state machine.
///
/// # Type Parameters
///
/// - `E`: clock of the shared store
/// - `S`: storage backend of the shared store
pub struct Session<E: Environment, S: Storage> {
    /// Shared store.
    store: Arc<Store<E, S>>,
    /// Stable identity from the transport.
    identity: String,
    /// Registered user. `None` until registration completes.
    user: Option<User>,
    /// Current screen.
    view: View,
    /// List cursor to restore when a sub-view returns to its list.
    return_cursor: usize,
    /// Terminal dimensions (columns, rows).
    terminal_size: (u16, u16),
    /// Transient status message. Cleared on the next key.
    status_message: Option<String>,
}

impl<E: Environment, S: Storage> Session<E, S> {
    /// Start a session for `identity`.
    ///
    /// A known identity lands on its home view; an unknown one is asked for
    /// a display name.
    pub fn new(store: Arc<Store<E, S>>, identity: impl Into<String>) -> Self {
        let identity = identity.into();
        let user = store.get_user(&identity);
        let view = match &user {
            Some(user) => home_view(user, 0),
            None => View::AwaitingIdentity { input: String::new() },
        };

        Self {
            store,
            identity,
            user,
            view,
            return_cursor: 0,
            terminal_size: (80, 24),
            status_message: None,
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<SessionAction> {
        match event {
            SessionEvent::Key(key) => self.handle_key(key),
            SessionEvent::Resize(cols, rows) => {
                self.terminal_size = (cols, rows);
                vec![SessionAction::Render]
            },
            SessionEvent::StoreChanged => {
                self.clamp_cursors();
                vec![SessionAction::Render]
            },
        }
    }

    fn handle_key(&mut self, key: KeyInput) -> Vec<SessionAction> {
        if key == KeyInput::Interrupt {
            return vec![SessionAction::Quit];
        }

        self.status_message = None;

        let current = self.view.clone();
        let next = match current {
            View::AwaitingIdentity { input } => self.on_awaiting_identity(input, key),
            View::TodoList { cursor } => self.on_todo_list(cursor, key),
            View::TodoDetail { item } => Some(self.on_todo_detail(item, key)),
            View::AdminHome { cursor } => self.on_admin_home(cursor, key),
            View::AdminEdit(form) => Some(self.on_admin_edit(form, key)),
            View::AdminProgress => Some(self.on_admin_progress(key)),
            View::AdminDeleteConfirm { target, name } => {
                Some(self.on_admin_delete_confirm(target, name, key))
            },
        };

        let Some(next) = next else {
            return vec![SessionAction::Quit];
        };

        if std::mem::discriminant(&next) != std::mem::discriminant(&self.view) {
            tracing::debug!(
                identity = %self.identity,
                from = self.view.name(),
                to = next.name(),
                "View transition"
            );
        }
        self.view = next;
        vec![SessionAction::Render]
    }

    fn on_awaiting_identity(&mut self, mut input: String, key: KeyInput) -> Option<View> {
        match key {
            KeyInput::Char(c) if !c.is_control() => {
                push_limited(&mut input, c, MAX_DISPLAY_NAME);
            },
            KeyInput::Backspace => {
                input.pop();
            },
            KeyInput::Enter => {
                let name = input.trim();
                if !name.is_empty() {
                    return Some(self.register(name.to_string(), input));
                }
            },
            KeyInput::Esc => return None,
            _ => {},
        }
        Some(View::AwaitingIdentity { input })
    }

    fn register(&mut self, display_name: String, input: String) -> View {
        let user = match self.store.register_user(&self.identity, &display_name) {
            Ok(committed) => Some(self.settle(committed)),
            // Another session with the same identity registered first.
            Err(StoreError::AlreadyExists(_)) => self.store.get_user(&self.identity),
            Err(e) => {
                tracing::warn!(identity = %self.identity, "Registration failed: {e}");
                None
            },
        };

        match user {
            Some(user) => {
                tracing::info!(
                    identity = %self.identity,
                    display_name = %user.display_name,
                    admin = user.is_admin,
                    "Session registered"
                );
                let view = home_view(&user, 0);
                self.user = Some(user);
                view
            },
            None => {
                self.status_message = Some("Registration failed, please try again.".to_string());
                View::AwaitingIdentity { input }
            },
        }
    }

    fn on_todo_list(&mut self, cursor: usize, key: KeyInput) -> Option<View> {
        let count = self.store.todo_count();
        let cursor = clamp_cursor(cursor, count);

        let cursor = match key {
            KeyInput::Up | KeyInput::Char('k') => cursor.saturating_sub(1),
            KeyInput::Down | KeyInput::Char('j') => step_down(cursor, count),
            KeyInput::Enter => {
                if let Some(item) = self.store.todo_at(cursor) {
                    self.return_cursor = cursor;
                    return Some(View::TodoDetail { item });
                }
                cursor
            },
            KeyInput::Char('q') => return None,
            _ => cursor,
        };
        Some(View::TodoList { cursor })
    }

    fn on_todo_detail(&mut self, item: TodoItem, key: KeyInput) -> View {
        match key {
            KeyInput::Char('c') | KeyInput::Enter => {
                match self.store.mark_complete(&self.identity, &item.id) {
                    Ok(committed) => self.settle(committed),
                    Err(e) => {
                        tracing::debug!(identity = %self.identity, "Completion rejected: {e}");
                        self.status_message = Some(ITEM_GONE.to_string());
                    },
                }
                self.back_to_list()
            },
            KeyInput::Esc | KeyInput::Char('q') => self.back_to_list(),
            _ => View::TodoDetail { item },
        }
    }

    fn on_admin_home(&mut self, cursor: usize, key: KeyInput) -> Option<View> {
        let count = self.store.todo_count();
        let cursor = clamp_cursor(cursor, count);

        let cursor = match key {
            KeyInput::Up | KeyInput::Char('k') => cursor.saturating_sub(1),
            KeyInput::Down | KeyInput::Char('j') => step_down(cursor, count),
            KeyInput::Char('K') => self.move_selected(cursor, Direction::Up),
            KeyInput::Char('J') => self.move_selected(cursor, Direction::Down),
            KeyInput::Char('a') => {
                self.return_cursor = cursor;
                return Some(View::AdminEdit(EditForm::create()));
            },
            KeyInput::Char('e') => {
                if let Some(item) = self.store.todo_at(cursor) {
                    self.return_cursor = cursor;
                    return Some(View::AdminEdit(EditForm::edit(&item)));
                }
                cursor
            },
            KeyInput::Char('d') => {
                if let Some(item) = self.store.todo_at(cursor) {
                    self.return_cursor = cursor;
                    return Some(View::AdminDeleteConfirm { target: item.id, name: item.name });
                }
                cursor
            },
            KeyInput::Char('p') => {
                self.return_cursor = cursor;
                return Some(View::AdminProgress);
            },
            KeyInput::Char('q') => return None,
            _ => cursor,
        };
        Some(View::AdminHome { cursor })
    }

    /// Move the item under `cursor`; returns where the cursor goes next.
    fn move_selected(&mut self, cursor: usize, direction: Direction) -> usize {
        let Some(item) = self.store.todo_at(cursor) else {
            return cursor;
        };

        match self.store.move_todo(&item.id, direction).map(|c| self.settle(c)) {
            Ok(MoveOutcome::Moved { index }) => index,
            Ok(MoveOutcome::NoOp) => cursor,
            Err(e) => {
                tracing::debug!(identity = %self.identity, "Move rejected: {e}");
                self.status_message = Some(ITEM_GONE.to_string());
                cursor
            },
        }
    }

    fn on_admin_edit(&mut self, mut form: EditForm, key: KeyInput) -> View {
        match key {
            KeyInput::Char(c) if !c.is_control() => form.push(c),
            KeyInput::Backspace => form.pop(),
            KeyInput::Tab => form.field = form.field.toggled(),
            KeyInput::Enter => return self.save(form),
            KeyInput::Esc => return self.back_to_home(),
            _ => {},
        }
        View::AdminEdit(form)
    }

    fn save(&mut self, form: EditForm) -> View {
        match &form.target {
            None => {
                let committed = self.store.add_todo(&form.name, &form.description);
                self.settle(committed);
            },
            Some(id) => match self.store.edit_todo(id, &form.name, &form.description) {
                Ok(committed) => self.settle(committed),
                Err(e) => {
                    tracing::debug!(identity = %self.identity, "Edit rejected: {e}");
                    self.status_message = Some(ITEM_GONE.to_string());
                },
            },
        }
        self.back_to_home()
    }

    fn on_admin_progress(&mut self, key: KeyInput) -> View {
        match key {
            KeyInput::Esc | KeyInput::Char('q') => self.back_to_home(),
            _ => View::AdminProgress,
        }
    }

    fn on_admin_delete_confirm(&mut self, target: String, name: String, key: KeyInput) -> View {
        match key {
            KeyInput::Char('y') => {
                match self.store.delete_todo(&target) {
                    Ok(committed) => self.settle(committed),
                    // Already gone is as good as deleted.
                    Err(e) => {
                        tracing::debug!(identity = %self.identity, "Delete found nothing: {e}");
                    },
                }
                self.back_to_home()
            },
            KeyInput::Char('n') | KeyInput::Esc => self.back_to_home(),
            _ => View::AdminDeleteConfirm { target, name },
        }
    }

    fn back_to_list(&self) -> View {
        View::TodoList { cursor: clamp_cursor(self.return_cursor, self.store.todo_count()) }
    }

    fn back_to_home(&self) -> View {
        View::AdminHome { cursor: clamp_cursor(self.return_cursor, self.store.todo_count()) }
    }

    fn clamp_cursors(&mut self) {
        let count = self.store.todo_count();
        self.return_cursor = clamp_cursor(self.return_cursor, count);
        if let View::TodoList { cursor } | View::AdminHome { cursor } = &mut self.view {
            *cursor = clamp_cursor(*cursor, count);
        }
    }

    /// Take the value of a store change, flagging a failed write in the
    /// status line. The change itself stands either way.
    fn settle<T>(&mut self, committed: Committed<T>) -> T {
        if let Some(e) = &committed.persist_error {
            tracing::debug!(identity = %self.identity, "Change not persisted: {e}");
            self.status_message = Some(NOT_SAVED.to_string());
        }
        committed.value
    }

    #[cfg(test)]
    pub(crate) fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// Shared store.
    pub fn store(&self) -> &Store<E, S> {
        &self.store
    }

    /// Identity supplied by the transport.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Registered user. `None` while awaiting a display name.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Current screen.
    pub fn view(&self) -> &View {
        &self.view
    }

    /// Terminal dimensions (columns, rows).
    pub fn terminal_size(&self) -> (u16, u16) {
        self.terminal_size
    }

    /// Current status message. `None` if no message.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }
}

/// Landing view for a registered user.
fn home_view(user: &User, cursor: usize) -> View {
    if user.is_admin { View::AdminHome { cursor } } else { View::TodoList { cursor } }
}

fn step_down(cursor: usize, count: usize) -> usize {
    if cursor + 1 < count { cursor + 1 } else { cursor }
}
