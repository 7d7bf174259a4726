//! Shared state for the checklist server.
//!
//! A single [`Store`] holds every user, every todo item and the admin-defined
//! display order. Many sessions hold the same store behind an `Arc`; reads run
//! concurrently while each mutation is serialized together with its durable
//! write.
//!
//! # Components
//!
//! - [`Store`]: locked aggregate with atomic read and mutate operations
//! - [`codec`]: JSON encoding of the whole store state
//! - [`Storage`]: durable byte sink ([`FileStorage`], [`MemoryStorage`],
//!   [`ChaoticStorage`])
//! - [`Environment`]: wall clock used for todo id generation

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod codec;
mod env;
mod error;
mod model;
pub mod storage;
mod store;

pub use codec::CodecError;
pub use env::{Environment, SimEnv, SystemEnv};
pub use error::StoreError;
pub use model::{CompletionStats, Direction, MoveOutcome, StoreState, TodoId, TodoItem, User};
pub use storage::{ChaoticStorage, FileStorage, MemoryStorage, Storage, StorageError};
pub use store::{Committed, Store, StoreRead};
