//! Session layer for the shared checklist
//!
//! Per-connection view state machines, a pure renderer, and the generic
//! runtime and supervisor that connect them to any transport.
//!
//! # Components
//!
//! - [`Session`]: view state machine and input dispatcher
//! - [`render`]: pure view renderer producing styled text
//! - [`Driver`]: trait for platform-specific session I/O
//! - [`Runtime`]: generic per-session loop using a Driver
//! - [`Supervisor`]: accepts connections from a [`Transport`] and runs
//!   one Runtime per connection

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
pub mod channel;
mod driver;
mod event;
mod input;
mod render;
mod runtime;
mod session;
mod supervisor;
pub mod view;

pub use action::SessionAction;
pub use driver::{Connection, Driver, Transport};
pub use event::SessionEvent;
pub use input::KeyInput;
pub use render::{plain_lines, render};
pub use runtime::Runtime;
pub use session::Session;
pub use supervisor::Supervisor;
pub use view::{EditField, EditForm, View};
