//! Client-side key/value persistence.
//!
//! The session core never touches the filesystem directly; it goes through
//! [`KeyValueStore`] so tests can substitute [`MemoryStore`].

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Failure to read or write a stored value.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing medium failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The store refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// A flat string key/value store. Every write replaces the whole value.
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `Ok(None)` when the key was never set or was removed.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrite the value under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
