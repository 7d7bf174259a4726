//! Durable storage for the encoded store.
//!
//! The store is persisted as one document that is rewritten in full after
//! every mutation, so the trait deals in whole byte buffers. The trait is
//! synchronous: the store calls it while holding its write lock.

mod chaotic;
mod error;
mod file;
mod memory;

pub use chaotic::ChaoticStorage;
pub use error::StorageError;
pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Whole-document storage backend.
///
/// Must be Clone (tests keep a handle to inspect what was written), Send +
/// Sync (shared by every session task) and synchronous.
pub trait Storage: Clone + Send + Sync + 'static {
    /// Read the stored document.
    ///
    /// Returns `None` if nothing has been stored yet.
    fn load(&self) -> Result<Option<Vec<u8>>, StorageError>;

    /// Replace the stored document.
    ///
    /// # Invariants
    ///
    /// - Post: a later `load` returns exactly `bytes`, or the previous
    ///   document if this call failed.
    fn save(&self, bytes: &[u8]) -> Result<(), StorageError>;
}
