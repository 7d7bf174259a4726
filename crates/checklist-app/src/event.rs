//! Session input events.
//!
//! Events originate from two sources:
//! - The connected terminal (keys, resize).
//! - The shared store, when another session commits a mutation.

use crate::KeyInput;

/// Events processed by the [`crate::Session`] state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Keyboard input.
    Key(KeyInput),

    /// Terminal resize (columns, rows).
    Resize(u16, u16),

    /// The store changed underneath this session.
    StoreChanged,
}
