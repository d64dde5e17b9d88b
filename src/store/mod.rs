//! Content-addressed byte stores.
//!
//! The cache module reads and writes through the [`ByteStore`] trait; the
//! kernel never touches a store directly. Keys are hierarchical,
//! `/`-separated paths. Stores are assumed to write atomically per key;
//! no cross-process locking is done here.
//!
//! - [`FsStore`] - rooted directory tree on the local filesystem
//! - [`MemoryStore`] - in-process map, for tests and ephemeral kernels

pub mod fs;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use fs::FsStore;
pub use memory::MemoryStore;

/// Errors raised by byte stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Nothing is stored under the key.
    #[error("Key not found: {0}")]
    NotFound(String),

    /// The key cannot be mapped onto the store.
    #[error("Invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// Underlying I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Key/value byte storage with hierarchical, path-safe keys.
#[async_trait]
pub trait ByteStore: Send + Sync {
    /// Fetch the bytes stored under `key`.
    ///
    /// Returns [`StoreError::NotFound`] if the key was never written.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Store `bytes` under `key`, creating intermediate levels as needed.
    ///
    /// Re-storing identical bytes under the same key is a no-op from the
    /// caller's point of view.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// Whether anything is stored under `key`.
    async fn contains(&self, key: &str) -> Result<bool, StoreError> {
        match self.get(key).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Check that `key` is a relative, normalized `/`-separated path.
///
/// Rejects empty keys, absolute keys, empty segments, `.` / `..`
/// segments, backslashes and NUL bytes.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let invalid = |reason: &str| StoreError::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    if key.is_empty() {
        return Err(invalid("empty key"));
    }
    if key.contains('\\') || key.contains('\0') {
        return Err(invalid("backslash or NUL in key"));
    }
    for segment in key.split('/') {
        match segment {
            "" => return Err(invalid("empty path segment")),
            "." | ".." => return Err(invalid("relative path segment")),
            _ => {}
        }
    }
    Ok(())
}
