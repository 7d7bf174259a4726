//! Per-session view state.
//!
//! Each variant carries only the data its screen needs. Cursors are indices
//! into the store's current order and are re-clamped against the live count
//! whenever they are used.

use checklist_core::{TodoId, TodoItem};

/// Maximum display name length accepted at registration.
pub const MAX_DISPLAY_NAME: usize = 20;

/// Maximum todo name length accepted by the edit form.
pub const MAX_TODO_NAME: usize = 50;

/// Maximum todo description length accepted by the edit form.
pub const MAX_TODO_DESCRIPTION: usize = 200;

/// Which edit form field receives typed characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditField {
    /// The item name.
    #[default]
    Name,
    /// The item description.
    Description,
}

impl EditField {
    /// The other field.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Name => Self::Description,
            Self::Description => Self::Name,
        }
    }
}

/// Buffers for the add/edit form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditForm {
    /// Item being edited. `None` when creating a new item.
    pub target: Option<TodoId>,
    /// Name buffer.
    pub name: String,
    /// Description buffer.
    pub description: String,
    /// Field receiving input.
    pub field: EditField,
}

impl EditForm {
    /// Empty form for a new item.
    pub fn create() -> Self {
        Self::default()
    }

    /// Form pre-filled from an existing item.
    pub fn edit(item: &TodoItem) -> Self {
        Self {
            target: Some(item.id.clone()),
            name: item.name.clone(),
            description: item.description.clone(),
            field: EditField::Name,
        }
    }

    /// Append a character to the active field, dropping it at the limit.
    pub fn push(&mut self, c: char) {
        let (buffer, limit) = self.active_mut();
        push_limited(buffer, c, limit);
    }

    /// Remove the last character of the active field.
    pub fn pop(&mut self) {
        self.active_mut().0.pop();
    }

    fn active_mut(&mut self) -> (&mut String, usize) {
        match self.field {
            EditField::Name => (&mut self.name, MAX_TODO_NAME),
            EditField::Description => (&mut self.description, MAX_TODO_DESCRIPTION),
        }
    }
}

/// Current screen of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// Unknown identity; prompting for a display name.
    AwaitingIdentity {
        /// Display name typed so far.
        input: String,
    },
    /// Regular user's list of items.
    TodoList {
        /// Selected index.
        cursor: usize,
    },
    /// One item's details, captured when the view was opened.
    TodoDetail {
        /// Item snapshot; it may since have been edited or deleted.
        item: TodoItem,
    },
    /// Admin's list of items.
    AdminHome {
        /// Selected index.
        cursor: usize,
    },
    /// Admin add/edit form.
    AdminEdit(EditForm),
    /// Admin completion matrix.
    AdminProgress,
    /// Admin delete confirmation.
    AdminDeleteConfirm {
        /// Item to delete.
        target: TodoId,
        /// Name shown in the prompt.
        name: String,
    },
}

impl View {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AwaitingIdentity { .. } => "awaiting_identity",
            Self::TodoList { .. } => "todo_list",
            Self::TodoDetail { .. } => "todo_detail",
            Self::AdminHome { .. } => "admin_home",
            Self::AdminEdit(_) => "admin_edit",
            Self::AdminProgress => "admin_progress",
            Self::AdminDeleteConfirm { .. } => "admin_delete_confirm",
        }
    }

    /// Whether the view belongs to the admin screens.
    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Self::AdminHome { .. }
                | Self::AdminEdit(_)
                | Self::AdminProgress
                | Self::AdminDeleteConfirm { .. }
        )
    }
}

/// Append `c` unless `buffer` already holds `limit` characters.
pub(crate) fn push_limited(buffer: &mut String, c: char, limit: usize) {
    if buffer.chars().count() < limit {
        buffer.push(c);
    }
}

/// Clamp a cursor into `[0, len)`; zero for an empty list.
pub(crate) fn clamp_cursor(cursor: usize, len: usize) -> usize {
    cursor.min(len.saturating_sub(1))
}
