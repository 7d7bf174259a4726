//! Generic runtime for one session.
//!
//! The Runtime drives a session's event loop, coordinating between:
//! - [`Session`]: view state machine
//! - [`Driver`]: platform-specific I/O
//! - the store's revision channel, so changes made by other sessions are
//!   rendered without waiting for input

use checklist_core::{Environment, Storage};
use tokio::sync::watch;

use crate::{Driver, Session, SessionAction, SessionEvent, render};

/// Generic runtime that orchestrates a Session and its Driver.
///
/// # Type Parameters
///
/// - `D`: platform-specific I/O driver
/// - `E`: clock of the shared store
/// - `S`: storage backend of the shared store
pub struct Runtime<D, E, S>
where
    D: Driver,
    E: Environment,
    S: Storage,
{
    driver: D,
    session: Session<E, S>,
    changes: watch::Receiver<u64>,
}

impl<D, E, S> Runtime<D, E, S>
where
    D: Driver,
    E: Environment,
    S: Storage,
{
    /// Create a runtime for `session` using `driver` for I/O.
    pub fn new(driver: D, session: Session<E, S>) -> Self {
        let mut changes = session.store().subscribe();
        changes.mark_unchanged();
        Self { driver, session, changes }
    }

    /// Run the session until it quits or the client goes away.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error. The session
    /// ends; the store and other sessions are unaffected.
    pub async fn run(mut self) -> Result<(), D::Error> {
        let result = self.event_loop().await;
        self.driver.stop();
        result
    }

    async fn event_loop(&mut self) -> Result<(), D::Error> {
        self.render().await?;

        loop {
            let event = tokio::select! {
                polled = self.driver.poll_event() => match polled? {
                    Some(event) => event,
                    None => {
                        tracing::debug!(identity = self.session.identity(), "Client went away");
                        return Ok(());
                    },
                },
                changed = self.changes.changed() => {
                    if changed.is_err() {
                        return Ok(());
                    }
                    SessionEvent::StoreChanged
                },
            };

            if self.process(event).await? {
                return Ok(());
            }
        }
    }

    /// Feed one event to the session and execute its actions.
    ///
    /// Returns `true` if the session should end.
    async fn process(&mut self, event: SessionEvent) -> Result<bool, D::Error> {
        let actions = self.session.handle(event);

        // This frame already reflects our own mutations.
        self.changes.mark_unchanged();

        for action in actions {
            match action {
                SessionAction::Render => self.render().await?,
                SessionAction::Quit => return Ok(true),
            }
        }
        Ok(false)
    }

    async fn render(&mut self) -> Result<(), D::Error> {
        let frame = render(&self.session);
        self.driver.render(&frame).await
    }

    /// Session state machine.
    pub fn session(&self) -> &Session<E, S> {
        &self.session
    }
}
