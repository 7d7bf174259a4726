//! Storage error types.
//!
//! - `Io`: the backing resource could not be read or written
//! - `Serialization`: the state could not be encoded for writing
//! - `Injected`: a fault injected by [`super::ChaoticStorage`]

use thiserror::Error;

use crate::CodecError;

/// Errors that can occur during storage operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// I/O error (file system)
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization failed before anything was written
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deliberate failure from fault injection
    #[error("chaotic failure injection")]
    Injected,
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl From<CodecError> for StorageError {
    fn from(err: CodecError) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
