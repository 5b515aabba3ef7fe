//! Async key-value persistence for client state.
//!
//! The session keeps exactly two entries here: the bearer token and the
//! serialized user record. Front ends pick a backend:
//!
//! - `FileStore`: a JSON map on disk, for the CLI and desktop builds
//! - `MemoryStore`: process-local, for tests and throwaway sessions

pub mod error;
pub mod file;
pub mod memory;

use async_trait::async_trait;

pub use error::StorageError;
pub use file::FileStore;
pub use memory::MemoryStore;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. A missing key is `Ok(None)`, not an error.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
