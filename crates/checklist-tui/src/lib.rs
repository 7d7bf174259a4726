//! Terminal frontends for the shared checklist
//!
//! A thin shell over [`checklist_app::Driver`] and
//! [`checklist_app::Transport`] that provides terminal-specific I/O. All
//! session logic lives in [`checklist_app`].
//!
//! - [`tcp`]: remote terminals over plain TCP
//! - [`terminal`]: one session on the local terminal
//! - [`server`]: the production server wiring

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod ansi;
pub mod keys;
pub mod server;
pub mod tcp;
pub mod terminal;

pub use server::{Server, ServerConfig};
pub use tcp::{TcpDriver, TcpError, TcpTransport};
pub use terminal::{TerminalDriver, TerminalError};
