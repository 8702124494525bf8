//! Durable key/value persistence for the state tree.
//!
//! The state manager only talks to the [`PersistentStore`] trait, so the
//! backing medium can be swapped: [`FileStore`] keeps everything in a single
//! JSON document on disk, [`MemoryStore`] keeps it in process.

pub mod file;
pub mod memory;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::PathBuf;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Failures reported by a [`PersistentStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O failed at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but does not hold a JSON object.
    #[error("stored data at {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize stored data: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The store refused the operation (offline backend, quota, injected fault).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Asynchronous key/value storage.
///
/// Keys are top-level names; values are whole JSON documents. `set` replaces
/// each given key wholesale and leaves other keys alone.
#[async_trait]
pub trait PersistentStore: Send + Sync {
    /// Returns the stored values for `keys`. Keys with nothing stored are
    /// absent from the returned map.
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError>;

    async fn set(&self, entries: Map<String, Value>) -> Result<(), StoreError>;

    async fn clear(&self) -> Result<(), StoreError>;
}
