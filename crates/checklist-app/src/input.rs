//! Terminal-agnostic keyboard input.

/// Keyboard input abstraction.
///
/// Decouples the session state machine from terminal libraries and wire
/// formats, enabling deterministic tests. The reorder keys arrive as
/// `Char('K')` and `Char('J')` and are case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Printable character.
    Char(char),
    /// Enter/Return key.
    Enter,
    /// Backspace key (delete last character).
    Backspace,
    /// Tab key (switch edit field).
    Tab,
    /// Escape key (back or cancel).
    Esc,
    /// Up arrow key.
    Up,
    /// Down arrow key.
    Down,
    /// Ctrl-C: ends the session from any view.
    Interrupt,
}
