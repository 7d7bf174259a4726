//! Checklist data model.
//!
//! [`StoreState`] is the plain aggregate (users, items, order) with the pure
//! state transitions used by [`crate::Store`]. It carries no locking or I/O so
//! the transitions can be tested and property-checked directly.
//!
//! # Invariants
//!
//! - `todo_order` lists every key of `todo_items` exactly once and nothing
//!   else.
//! - `users` holds at most one record per identity and each record is keyed
//!   by its own identity.
//! - `is_admin` is decided at registration and never changes.
//! - `completions` may name items that no longer exist.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Opaque todo identifier (`todo_<millis>` with an optional `_<n>` suffix).
pub type TodoId = String;

/// A single checklist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    /// Immutable identifier.
    pub id: TodoId,
    /// Short name shown in lists.
    pub name: String,
    /// Longer description shown in the detail view.
    pub description: String,
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable identity supplied by the transport.
    pub identity: String,
    /// Name chosen at registration.
    pub display_name: String,
    /// Whether this user administers the list.
    pub is_admin: bool,
    /// Ids of completed items. Grows only; may contain deleted ids.
    #[serde(default)]
    pub completions: BTreeSet<TodoId>,
}

impl User {
    /// Whether the user has completed the given item.
    pub fn has_completed(&self, todo_id: &str) -> bool {
        self.completions.contains(todo_id)
    }
}

/// Reorder direction for [`crate::Store::move_todo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards the start of the list.
    Up,
    /// Towards the end of the list.
    Down,
}

/// Result of a reorder request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The item was swapped with its neighbour and now sits at `index`.
    Moved {
        /// New position of the moved item.
        index: usize,
    },
    /// The item was already at the boundary; nothing changed.
    NoOp,
}

/// Completion aggregate for one item over non-admin users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompletionStats {
    /// Non-admin users that completed the item.
    pub completed: usize,
    /// All non-admin users.
    pub total: usize,
}

/// Everything the store persists.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoreState {
    /// Users keyed by identity.
    #[serde(default)]
    pub users: BTreeMap<String, User>,
    /// Items keyed by id.
    #[serde(default)]
    pub todo_items: BTreeMap<TodoId, TodoItem>,
    /// Display order of item ids.
    #[serde(default)]
    pub todo_order: Vec<TodoId>,
}

impl StoreState {
    /// User registered under `identity`, if any.
    pub fn user(&self, identity: &str) -> Option<&User> {
        self.users.get(identity)
    }

    /// Item with the given id, if it exists.
    pub fn todo(&self, id: &str) -> Option<&TodoItem> {
        self.todo_items.get(id)
    }

    /// Number of items in the list.
    pub fn todo_count(&self) -> usize {
        self.todo_order.len()
    }

    /// Item at `index` in display order.
    pub fn todo_at(&self, index: usize) -> Option<&TodoItem> {
        self.todo_order.get(index).and_then(|id| self.todo_items.get(id))
    }

    /// Position of `id` in display order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.todo_order.iter().position(|candidate| candidate == id)
    }

    /// Items in display order.
    pub fn ordered_todos(&self) -> impl Iterator<Item = &TodoItem> {
        self.todo_order.iter().filter_map(|id| self.todo_items.get(id))
    }

    /// Users without admin rights, in identity order.
    pub fn non_admin_users(&self) -> impl Iterator<Item = &User> {
        self.users.values().filter(|user| !user.is_admin)
    }

    /// How many non-admin users completed `todo_id`.
    ///
    /// Unknown ids report zero completions rather than an error.
    pub fn completion_stats(&self, todo_id: &str) -> CompletionStats {
        self.non_admin_users().fold(CompletionStats::default(), |mut stats, user| {
            stats.total += 1;
            if user.has_completed(todo_id) {
                stats.completed += 1;
            }
            stats
        })
    }

    /// Verify the order/items bijection and user keying.
    ///
    /// Returns a description of the first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut seen = HashSet::with_capacity(self.todo_order.len());
        for id in &self.todo_order {
            if !seen.insert(id.as_str()) {
                return Err(format!("duplicate id in todo order: {id}"));
            }
            if !self.todo_items.contains_key(id) {
                return Err(format!("todo order references unknown id: {id}"));
            }
        }
        if let Some(id) = self.todo_items.keys().find(|id| !seen.contains(id.as_str())) {
            return Err(format!("todo missing from order: {id}"));
        }
        for (key, item) in &self.todo_items {
            if key != &item.id {
                return Err(format!("todo keyed as {key} has id {}", item.id));
            }
        }
        for (key, user) in &self.users {
            if key != &user.identity {
                return Err(format!("user keyed as {key} has identity {}", user.identity));
            }
        }
        Ok(())
    }

    /// Fresh id derived from `now_millis`, suffixed on collision.
    ///
    /// Ids still named by orphaned completions count as taken, so a new item
    /// never inherits a deleted item's completions.
    pub(crate) fn next_todo_id(&self, now_millis: u64) -> TodoId {
        let base = format!("todo_{now_millis}");
        let mut candidate = base.clone();
        let mut suffix: u64 = 0;
        while self.id_taken(&candidate) {
            suffix += 1;
            candidate = format!("{base}_{suffix}");
        }
        candidate
    }

    fn id_taken(&self, id: &str) -> bool {
        self.todo_items.contains_key(id) || self.users.values().any(|user| user.has_completed(id))
    }

    pub(crate) fn register_user(
        &mut self,
        identity: &str,
        display_name: &str,
    ) -> Result<User, StoreError> {
        if self.users.contains_key(identity) {
            return Err(StoreError::AlreadyExists(identity.to_string()));
        }

        let user = User {
            identity: identity.to_string(),
            display_name: display_name.to_string(),
            is_admin: self.users.is_empty(),
            completions: BTreeSet::new(),
        };
        self.users.insert(user.identity.clone(), user.clone());
        Ok(user)
    }

    pub(crate) fn add_todo(&mut self, id: TodoId, name: &str, description: &str) -> TodoItem {
        debug_assert!(!self.todo_items.contains_key(&id));

        let item = TodoItem { id, name: name.to_string(), description: description.to_string() };
        self.todo_order.push(item.id.clone());
        self.todo_items.insert(item.id.clone(), item.clone());
        item
    }

    pub(crate) fn edit_todo(
        &mut self,
        id: &str,
        name: &str,
        description: &str,
    ) -> Result<(), StoreError> {
        let item =
            self.todo_items.get_mut(id).ok_or_else(|| StoreError::TodoNotFound(id.to_string()))?;
        item.name = name.to_string();
        item.description = description.to_string();
        Ok(())
    }

    pub(crate) fn delete_todo(&mut self, id: &str) -> Result<(), StoreError> {
        if self.todo_items.remove(id).is_none() {
            return Err(StoreError::TodoNotFound(id.to_string()));
        }
        // Completions keep the stale id on purpose.
        self.todo_order.retain(|candidate| candidate != id);
        Ok(())
    }

    pub(crate) fn move_todo(
        &mut self,
        id: &str,
        direction: Direction,
    ) -> Result<MoveOutcome, StoreError> {
        let index = self.position(id).ok_or_else(|| StoreError::TodoNotFound(id.to_string()))?;

        let target = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => Some(index + 1).filter(|&next| next < self.todo_order.len()),
        };

        Ok(match target {
            Some(target) => {
                self.todo_order.swap(index, target);
                MoveOutcome::Moved { index: target }
            },
            None => MoveOutcome::NoOp,
        })
    }

    /// Returns `true` if the completion set changed.
    pub(crate) fn mark_complete(
        &mut self,
        identity: &str,
        todo_id: &str,
    ) -> Result<bool, StoreError> {
        if !self.todo_items.contains_key(todo_id) {
            return Err(StoreError::TodoNotFound(todo_id.to_string()));
        }
        let user = self
            .users
            .get_mut(identity)
            .ok_or_else(|| StoreError::UserNotFound(identity.to_string()))?;
        Ok(user.completions.insert(todo_id.to_string()))
    }
}
