//! Production checklist server.
//!
//! Wraps the generic [`Supervisor`] with the TCP transport, the system clock
//! and file-backed storage.

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use checklist_app::Supervisor;
use checklist_core::{FileStorage, Store, SystemEnv};

use crate::tcp::{TcpError, TcpTransport};

/// Default TCP listen address.
pub const DEFAULT_BIND: &str = "0.0.0.0:2222";

/// Default data file, relative to the working directory.
pub const DEFAULT_DATA_FILE: &str = "checklist_data.json";

/// Shared store type used by the binary.
pub type SharedStore = Arc<Store<SystemEnv, FileStorage>>;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (`host:port`).
    pub bind_address: String,
    /// Data file path.
    pub data_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: DEFAULT_BIND.to_string(), data_path: PathBuf::from(DEFAULT_DATA_FILE) }
    }
}

/// Open the shared store backed by `path`.
pub fn open_store(path: impl Into<PathBuf>) -> SharedStore {
    let storage = FileStorage::new(path);
    tracing::info!("Using data file {}", storage.path().display());
    Arc::new(Store::open(SystemEnv::new(), storage))
}

/// TCP checklist server.
pub struct Server {
    transport: TcpTransport,
    store: SharedStore,
}

impl Server {
    /// Load the store and bind the listener.
    pub async fn bind(config: ServerConfig) -> Result<Self, TcpError> {
        let store = open_store(config.data_path);
        let transport = TcpTransport::bind(&config.bind_address).await?;
        Ok(Self { transport, store })
    }

    /// Local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, TcpError> {
        self.transport.local_addr()
    }

    /// Shared store.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Serve sessions until the task is cancelled.
    pub async fn run(self) {
        if let Ok(addr) = self.local_addr() {
            tracing::info!("Server listening on {addr}");
        }
        Supervisor::new(self.transport, self.store).run().await;
    }
}
