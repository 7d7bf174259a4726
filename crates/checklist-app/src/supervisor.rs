//! Session supervision.
//!
//! The [`Supervisor`] accepts connections from a [`Transport`], creates a
//! [`Session`] per connection against the shared store, and runs each one
//! on its own task. A failing session is logged and dropped; it never takes
//! down the supervisor or other sessions.

use std::sync::Arc;

use checklist_core::{Environment, Storage, Store};
use tokio::task::JoinSet;

use crate::{Connection, Driver, Runtime, Session, Transport};

/// Accept loop that spawns one session task per connection.
pub struct Supervisor<T, E, S>
where
    T: Transport,
    E: Environment,
    S: Storage,
{
    transport: T,
    store: Arc<Store<E, S>>,
    sessions: JoinSet<()>,
}

impl<T, E, S> Supervisor<T, E, S>
where
    T: Transport,
    E: Environment,
    S: Storage,
{
    /// Supervise connections from `transport` against `store`.
    pub fn new(transport: T, store: Arc<Store<E, S>>) -> Self {
        Self { transport, store, sessions: JoinSet::new() }
    }

    /// Accept connections until the transport closes, then wait for the
    /// remaining sessions to end.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                accepted = self.transport.accept() => match accepted {
                    Ok(Some(connection)) => self.spawn(connection),
                    Ok(None) => break,
                    Err(e) => tracing::error!("Accept error: {e}"),
                },
                Some(joined) = self.sessions.join_next() => log_join(joined),
            }
        }

        tracing::info!(active = self.sessions.len(), "Transport closed, draining sessions");
        while let Some(joined) = self.sessions.join_next().await {
            log_join(joined);
        }
    }

    fn spawn(&mut self, connection: Connection<T::Driver>) {
        let Connection { identity, driver } = connection;
        let session = Session::new(Arc::clone(&self.store), identity.clone());
        tracing::info!(
            identity = %identity,
            registered = session.user().is_some(),
            active = self.sessions.len() + 1,
            "Session started"
        );

        self.sessions.spawn(run_session(identity, driver, session));
    }
}

async fn run_session<D, E, S>(identity: String, driver: D, session: Session<E, S>)
where
    D: Driver,
    E: Environment,
    S: Storage,
{
    match Runtime::new(driver, session).run().await {
        Ok(()) => tracing::info!(identity = %identity, "Session ended"),
        Err(e) => tracing::warn!(identity = %identity, "Session ended with error: {e}"),
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        tracing::error!("Session task failed: {e}");
    }
}
