//! In-process transport over tokio channels.
//!
//! Lets tests and simulations drive real [`crate::Runtime`]s and a real
//! [`crate::Supervisor`] without sockets or terminals. A [`ChannelConnector`]
//! opens connections; each yields a [`ChannelClient`] that sends events and
//! receives rendered frames as plain lines.

use ratatui::text::Text;
use tokio::sync::mpsc;

use crate::{Connection, Driver, SessionEvent, Transport, render::plain_lines};

/// Channel driver errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// The client side was dropped.
    #[error("channel client closed")]
    Closed,
}

/// Server side of one in-process connection.
#[derive(Debug)]
pub struct ChannelDriver {
    events: mpsc::UnboundedReceiver<SessionEvent>,
    frames: mpsc::UnboundedSender<Vec<String>>,
}

impl Driver for ChannelDriver {
    type Error = ChannelError;

    async fn poll_event(&mut self) -> Result<Option<SessionEvent>, Self::Error> {
        Ok(self.events.recv().await)
    }

    async fn render(&mut self, frame: &Text<'_>) -> Result<(), Self::Error> {
        self.frames.send(plain_lines(frame)).map_err(|_| ChannelError::Closed)
    }

    fn stop(&mut self) {
        self.events.close();
    }
}

/// Client side of one in-process connection.
#[derive(Debug)]
pub struct ChannelClient {
    events: mpsc::UnboundedSender<SessionEvent>,
    frames: mpsc::UnboundedReceiver<Vec<String>>,
}

impl ChannelClient {
    /// Send an event to the session. Returns `false` if the session ended.
    pub fn send(&self, event: SessionEvent) -> bool {
        self.events.send(event).is_ok()
    }

    /// Next rendered frame. `None` once the session has ended.
    pub async fn next_frame(&mut self) -> Option<Vec<String>> {
        self.frames.recv().await
    }

    /// Most recent frame already delivered, skipping older ones.
    ///
    /// Returns `None` if no frame is waiting.
    pub fn latest_frame(&mut self) -> Option<Vec<String>> {
        let mut latest = None;
        while let Ok(frame) = self.frames.try_recv() {
            latest = Some(frame);
        }
        latest
    }
}

/// Create a connected driver/client pair.
pub fn channel_pair() -> (ChannelDriver, ChannelClient) {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (frame_tx, frame_rx) = mpsc::unbounded_channel();
    (
        ChannelDriver { events: event_rx, frames: frame_tx },
        ChannelClient { events: event_tx, frames: frame_rx },
    )
}

/// Transport that accepts connections opened through a [`ChannelConnector`].
#[derive(Debug)]
pub struct ChannelTransport {
    incoming: mpsc::UnboundedReceiver<Connection<ChannelDriver>>,
}

/// Opens connections to a [`ChannelTransport`].
///
/// Dropping every connector closes the transport.
#[derive(Debug, Clone)]
pub struct ChannelConnector {
    outgoing: mpsc::UnboundedSender<Connection<ChannelDriver>>,
}

impl ChannelConnector {
    /// Connect as `identity`. Returns `None` if the transport is gone.
    pub fn connect(&self, identity: impl Into<String>) -> Option<ChannelClient> {
        let (driver, client) = channel_pair();
        self.outgoing.send(Connection { identity: identity.into(), driver }).ok()?;
        Some(client)
    }
}

/// Create an in-process transport and its connector.
pub fn channel_transport() -> (ChannelTransport, ChannelConnector) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelTransport { incoming: rx }, ChannelConnector { outgoing: tx })
}

impl Transport for ChannelTransport {
    type Driver = ChannelDriver;
    type Error = ChannelError;

    async fn accept(&mut self) -> Result<Option<Connection<ChannelDriver>>, Self::Error> {
        Ok(self.incoming.recv().await)
    }
}
