//! Plain TCP transport for remote terminals.
//!
//! A client connects, sends its identity as the first line, then switches
//! its terminal to raw mode and streams key bytes:
//!
//! ```bash
//! (echo alice; stty raw -echo; cat) | nc host 2222   # or any raw client
//! ```
//!
//! Each accepted connection is handshaken on its own task so one slow client
//! cannot stall the accept loop. The identity line is trusted as-is.

use std::{collections::VecDeque, io, net::SocketAddr, time::Duration};

use checklist_app::{Connection, Driver, KeyInput, SessionEvent, Transport};
use ratatui::text::Text;
use thiserror::Error;
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{
        TcpListener, TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    task::JoinSet,
};

use crate::{ansi, keys::KeyDecoder};

/// Longest accepted identity line in bytes, newline included. Longer lines
/// are rejected, never truncated.
pub const MAX_IDENTITY_LINE: u64 = 256;

/// How long a client may take to send its identity line.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

const READ_CHUNK: usize = 1024;

/// TCP transport errors.
#[derive(Debug, Error)]
pub enum TcpError {
    /// I/O error on the listener or a connection.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid bind address.
    #[error("configuration error: {0}")]
    Config(String),

    /// A client failed to identify itself.
    #[error("handshake with {peer} failed: {reason}")]
    Handshake {
        /// Remote address.
        peer: SocketAddr,
        /// What went wrong.
        reason: String,
    },
}

/// Listening TCP transport.
pub struct TcpTransport {
    listener: TcpListener,
    handshakes: JoinSet<Result<Connection<TcpDriver>, TcpError>>,
}

impl TcpTransport {
    /// Bind to `address` (`host:port`).
    pub async fn bind(address: &str) -> Result<Self, TcpError> {
        let addr: SocketAddr = address
            .parse()
            .map_err(|e| TcpError::Config(format!("invalid bind address '{address}': {e}")))?;
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, handshakes: JoinSet::new() })
    }

    /// Local address the transport is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, TcpError> {
        Ok(self.listener.local_addr()?)
    }
}

impl Transport for TcpTransport {
    type Driver = TcpDriver;
    type Error = TcpError;

    async fn accept(&mut self) -> Result<Option<Connection<TcpDriver>>, TcpError> {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer) = accepted?;
                    tracing::debug!("New connection from {peer}");
                    self.handshakes.spawn(handshake(stream, peer));
                },
                Some(done) = self.handshakes.join_next() => {
                    return match done {
                        Ok(result) => result.map(Some),
                        Err(e) => Err(TcpError::Io(io::Error::other(e))),
                    };
                },
            }
        }
    }
}

/// Read the identity line and prepare the client's terminal.
async fn handshake(stream: TcpStream, peer: SocketAddr) -> Result<Connection<TcpDriver>, TcpError> {
    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!(%peer, "Could not disable Nagle's algorithm: {e}");
    }
    let (read, write) = stream.into_split();
    let mut reader = BufReader::new(read);

    let mut line = Vec::new();
    let mut limited = (&mut reader).take(MAX_IDENTITY_LINE);
    let read_line = limited.read_until(b'\n', &mut line);
    match tokio::time::timeout(HANDSHAKE_TIMEOUT, read_line).await {
        Ok(Ok(_)) => {},
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            return Err(TcpError::Handshake { peer, reason: "timed out".to_string() });
        },
    }

    // Without the newline the identity was cut at the limit or by EOF.
    if line.last() != Some(&b'\n') {
        return Err(TcpError::Handshake {
            peer,
            reason: "identity line too long or unterminated".to_string(),
        });
    }

    let identity = String::from_utf8_lossy(&line).trim().to_string();
    if identity.is_empty() {
        return Err(TcpError::Handshake { peer, reason: "empty identity line".to_string() });
    }

    let mut driver = TcpDriver::new(reader, write);
    driver.writer.write_all(&ansi::session_start()?).await?;
    tracing::debug!(%peer, identity = %identity, "Handshake complete");
    Ok(Connection { identity, driver })
}

/// Driver for one TCP client.
pub struct TcpDriver {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    decoder: KeyDecoder,
    pending: VecDeque<KeyInput>,
    buf: Box<[u8]>,
}

impl TcpDriver {
    fn new(reader: BufReader<OwnedReadHalf>, writer: OwnedWriteHalf) -> Self {
        Self {
            reader,
            writer,
            decoder: KeyDecoder::new(),
            pending: VecDeque::new(),
            buf: vec![0; READ_CHUNK].into_boxed_slice(),
        }
    }
}

impl Driver for TcpDriver {
    type Error = TcpError;

    async fn poll_event(&mut self) -> Result<Option<SessionEvent>, TcpError> {
        loop {
            if let Some(key) = self.pending.pop_front() {
                return Ok(Some(SessionEvent::Key(key)));
            }

            // `read` is cancel-safe; decoding happens only after it completes.
            let n = self.reader.read(&mut self.buf).await?;
            if n == 0 {
                return Ok(None);
            }
            self.pending.extend(self.decoder.feed(&self.buf[..n]));
        }
    }

    async fn render(&mut self, frame: &Text<'_>) -> Result<(), TcpError> {
        let bytes = ansi::encode_frame(frame)?;
        self.writer.write_all(&bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }

    fn stop(&mut self) {
        // Best effort: the client may already be gone.
        if let Ok(bytes) = ansi::session_end() {
            let _ = self.writer.try_write(&bytes);
        }
    }
}
