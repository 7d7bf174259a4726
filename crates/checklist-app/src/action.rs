//! Session side-effects.
//!
//! Store mutations happen inside [`crate::Session::handle`]; what is left for
//! the runtime is output and termination.

/// Actions produced by the Session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// Render the current view.
    Render,

    /// End this session. Other sessions and the store are unaffected.
    Quit,
}
