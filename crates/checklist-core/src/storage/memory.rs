#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]

use std::sync::{Arc, Mutex, PoisonError};

use super::{Storage, StorageError};

/// In-memory storage implementation for testing and simulation
///
/// Holds the last saved document behind `Arc<Mutex<>>`, so clones observe the
/// same contents. Also counts saves so tests can assert that no-op
/// operations skip the durable write.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryStorageInner>>,
}

#[derive(Debug, Default)]
struct MemoryStorageInner {
    document: Option<Vec<u8>>,
    saves: usize,
}

impl MemoryStorage {
    /// Create a new empty `MemoryStorage`
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-loaded with `bytes`, as if a previous process saved them.
    pub fn with_document(bytes: impl Into<Vec<u8>>) -> Self {
        let storage = Self::new();
        storage.lock().document = Some(bytes.into());
        storage
    }

    /// Last saved document.
    pub fn document(&self) -> Option<Vec<u8>> {
        self.lock().document.clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryStorageInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.lock().document.clone())
    }

    fn save(&self, bytes: &[u8]) -> Result<(), StorageError> {
        let mut inner = self.lock();
        inner.document = Some(bytes.to_vec());
        inner.saves += 1;
        Ok(())
    }
}
