//! Driver and transport traits for abstracting session I/O.
//!
//! The [`Driver`] trait decouples the session runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration. A [`Transport`] produces one driver per accepted
//! connection for the [`crate::Supervisor`].

use std::future::Future;

use ratatui::text::Text;

use crate::SessionEvent;

/// Abstracts I/O for one connected session.
///
/// # Implementations
///
/// - **TCP**: raw terminal bytes in, ANSI frames out
/// - **Terminal**: crossterm events in, ratatui frames out
/// - **Channel**: in-process channels for tests
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next input event.
    ///
    /// Returns `None` once the client has gone away. Must be cancel-safe:
    /// the runtime races it against store change notifications.
    fn poll_event(
        &mut self,
    ) -> impl Future<Output = Result<Option<SessionEvent>, Self::Error>> + Send;

    /// Replace the client's screen with `frame`.
    ///
    /// # Errors
    ///
    /// Returns an error if the output sink is closed or the write fails.
    fn render(&mut self, frame: &Text<'_>) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Release the client's terminal and clean up resources.
    fn stop(&mut self);
}

/// An accepted connection: a stable identity plus its I/O driver.
#[derive(Debug)]
pub struct Connection<D> {
    /// Stable identity string supplied by the transport.
    pub identity: String,
    /// I/O for this connection.
    pub driver: D,
}

/// Accepts connections and yields one [`Driver`] per connection.
pub trait Transport: Send {
    /// Driver type produced per connection.
    type Driver: Driver + 'static;

    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next connection.
    ///
    /// Returns `None` when the transport is closed and no further connections
    /// will arrive. Must be cancel-safe: the supervisor races it against
    /// session completion.
    ///
    /// # Errors
    ///
    /// Returns an error if a single accept fails. The transport stays usable.
    fn accept(
        &mut self,
    ) -> impl Future<Output = Result<Option<Connection<Self::Driver>>, Self::Error>> + Send;
}
