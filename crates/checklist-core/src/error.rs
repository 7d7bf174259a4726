//! Store operation errors.
//!
//! All of these are recoverable from a session's point of view: the caller
//! falls back to a safe view and carries on. Persistence failures are not
//! errors here: the mutation succeeded, and its write outcome travels in
//! [`crate::Committed`].

use thiserror::Error;

use crate::TodoId;

/// Errors returned by [`crate::Store`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A user is already registered under this identity.
    #[error("user already exists: {0}")]
    AlreadyExists(String),

    /// The todo item does not exist (never created or concurrently deleted).
    #[error("todo not found: {0}")]
    TodoNotFound(TodoId),

    /// No user is registered under this identity.
    #[error("user not found: {0}")]
    UserNotFound(String),
}

impl StoreError {
    /// Whether this is one of the not-found variants.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TodoNotFound(_) | Self::UserNotFound(_))
    }
}
